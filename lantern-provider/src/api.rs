//! Transport seam for the remote sources API
//!
//! `SourceProvider` only builds and interprets bodies; moving them over the
//! network is the job of a `SourceApi` implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::wire::WireObject;

/// Errors returned by a `SourceApi`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response body: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Remote CRUD operations on sources
#[async_trait]
pub trait SourceApi: Send + Sync {
    /// Fetch a source as raw JSON; `None` when it does not exist
    async fn get_source(&self, id: &str) -> Result<Option<serde_json::Value>, ApiError>;

    /// Create a source and return the stored entity, including its `id`
    async fn create_source(&self, body: WireObject) -> Result<WireObject, ApiError>;

    /// Update a source in place and return the stored entity
    async fn update_source(&self, id: &str, body: WireObject) -> Result<WireObject, ApiError>;

    async fn delete_source(&self, id: &str) -> Result<(), ApiError>;
}
