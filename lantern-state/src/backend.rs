//! Storage seam for state files

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::state::StateFile;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Unknown state backend '{0}' (supported: local)")]
    UnsupportedBackend(String),

    #[error("Invalid backend configuration: {0}")]
    Configuration(String),

    #[error("State file is not usable: {0}")]
    InvalidState(String),

    #[error("State belongs to lineage {expected}; refusing to overwrite it with lineage {actual}")]
    LineageMismatch { expected: String, actual: String },

    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode state: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| BackendError::Io { action, path, source }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait StateBackend: Send + Sync {
    /// `None` until the first write
    async fn read_state(&self) -> BackendResult<Option<StateFile>>;

    /// Replace the stored state; the caller bumps the serial first
    async fn write_state(&self, state: &StateFile) -> BackendResult<()>;

    /// Create whatever the backend needs before the first write
    async fn init(&self) -> BackendResult<()>;
}

/// `backend` section of a project file
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub backend_type: String,
    pub path: Option<PathBuf>,
}

impl BackendConfig {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        BackendConfig {
            backend_type: "local".to_string(),
            path: Some(path.into()),
        }
    }
}
