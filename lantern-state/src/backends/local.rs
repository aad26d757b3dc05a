//! State kept in a JSON file on the local disk

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::backend::{BackendConfig, BackendError, BackendResult, StateBackend};
use crate::state::StateFile;

pub struct LocalBackend {
    state_path: PathBuf,
}

impl LocalBackend {
    pub const DEFAULT_STATE_FILE: &'static str = "lantern.state.json";

    pub fn with_path(state_path: impl Into<PathBuf>) -> Self {
        LocalBackend {
            state_path: state_path.into(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        match &config.path {
            None => Ok(Self::with_path(Self::DEFAULT_STATE_FILE)),
            Some(path) if path.as_os_str().is_empty() => Err(BackendError::Configuration(
                "local backend path must not be empty".to_string(),
            )),
            Some(path) => Ok(Self::with_path(path.clone())),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Sibling file the next state is staged in before it replaces the real one
    fn staging_path(&self) -> PathBuf {
        let mut name = self.state_path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.state_path.with_file_name(name)
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        let content = match tokio::fs::read_to_string(&self.state_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::io("read", &self.state_path)(e)),
        };

        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!("{}: {}", self.state_path.display(), e))
        })?;
        state.validate().map(Some)
    }

    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        if let Some(stored) = self.read_state().await?
            && stored.lineage != state.lineage
        {
            return Err(BackendError::LineageMismatch {
                expected: stored.lineage,
                actual: state.lineage.clone(),
            });
        }

        let content = serde_json::to_string_pretty(state)?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, content)
            .await
            .map_err(BackendError::io("write", &staging))?;
        tokio::fs::rename(&staging, &self.state_path)
            .await
            .map_err(BackendError::io("replace", &self.state_path))?;

        log::debug!(
            "wrote state serial {} to {}",
            state.serial,
            self.state_path.display()
        );
        Ok(())
    }

    async fn init(&self) -> BackendResult<()> {
        match self.state_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
                .await
                .map_err(BackendError::io("create", parent)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ResourceState;
    use lantern_core::resource::ResourceId;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_reads_as_none_then_round_trips() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("state.json"));
        assert!(backend.read_state().await.unwrap().is_none());

        let mut state = StateFile::new();
        state.record(
            ResourceState::new(&ResourceId::new("source", "warehouse"), "lantern")
                .with_identifier("src-1"),
        );
        state.next_serial();
        backend.write_state(&state).await.unwrap();

        let read = backend.read_state().await.unwrap().unwrap();
        assert_eq!(read.serial, 1);
        assert_eq!(read.resources, state.resources);
        assert!(!backend.staging_path().exists());
    }

    #[tokio::test]
    async fn refuses_to_overwrite_another_lineage() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("state.json"));

        backend.write_state(&StateFile::new()).await.unwrap();
        let result = backend.write_state(&StateFile::new()).await;
        assert!(matches!(result, Err(BackendError::LineageMismatch { .. })));
    }

    #[tokio::test]
    async fn corrupt_file_is_invalid_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let backend = LocalBackend::with_path(path);
        assert!(matches!(
            backend.read_state().await,
            Err(BackendError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn init_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let backend = LocalBackend::with_path(&path);

        backend.init().await.unwrap();
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn config_paths() {
        let unset = BackendConfig {
            backend_type: "local".to_string(),
            path: None,
        };
        assert_eq!(
            LocalBackend::from_config(&unset).unwrap().state_path(),
            Path::new(LocalBackend::DEFAULT_STATE_FILE)
        );
        assert!(matches!(
            LocalBackend::from_config(&BackendConfig::local("")),
            Err(BackendError::Configuration(_))
        ));
    }
}
