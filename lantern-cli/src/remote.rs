//! File-backed stand-in for the sources REST API
//!
//! Stores every source body in one JSON file keyed by id. Behaves like the
//! remote service where the provider can observe it: ids are UUIDs, bodies
//! are echoed back, and an update without a `type` keeps the stored one.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::json;

use lantern_provider::api::{ApiError, SourceApi};
use lantern_provider::wire::{DISCRIMINATOR_KEY, WireObject};

type Store = BTreeMap<String, serde_json::Value>;

pub struct FileSourceApi {
    path: PathBuf,
}

impl FileSourceApi {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<Store, ApiError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Store::new()),
            Err(e) => Err(ApiError::Transport(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, store: &Store) -> Result<(), ApiError> {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(store)?;
            fs::write(&self.path, content)
        };
        write().map_err(|e| {
            ApiError::Transport(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl SourceApi for FileSourceApi {
    async fn get_source(&self, id: &str) -> Result<Option<serde_json::Value>, ApiError> {
        Ok(self.load()?.remove(id))
    }

    async fn create_source(&self, mut body: WireObject) -> Result<WireObject, ApiError> {
        if !body.contains_key(DISCRIMINATOR_KEY) {
            return Err(ApiError::Rejected {
                status: 400,
                message: "source type is required".to_string(),
            });
        }

        let mut store = self.load()?;
        let id = uuid::Uuid::new_v4().to_string();
        body.insert("id", json!(id));
        store.insert(id.clone(), body.clone().into_json());
        self.save(&store)?;
        log::debug!("remote: created source {}", id);
        Ok(body)
    }

    async fn update_source(&self, id: &str, mut body: WireObject) -> Result<WireObject, ApiError> {
        let mut store = self.load()?;
        let stored = store
            .get(id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;

        let stored_type = stored.get(DISCRIMINATOR_KEY).cloned();
        let sent_type = body.get(DISCRIMINATOR_KEY).cloned();
        match (sent_type, stored_type) {
            (None, Some(tag)) => body.insert(DISCRIMINATOR_KEY, tag),
            (Some(sent), Some(tag)) if sent != tag => {
                return Err(ApiError::Rejected {
                    status: 409,
                    message: format!("source type cannot change from {} to {}", tag, sent),
                });
            }
            _ => {}
        }

        body.insert("id", json!(id));
        store.insert(id.to_string(), body.clone().into_json());
        self.save(&store)?;
        Ok(body)
    }

    async fn delete_source(&self, id: &str) -> Result<(), ApiError> {
        let mut store = self.load()?;
        store
            .remove(id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        self.save(&store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> (tempfile::TempDir, FileSourceApi) {
        let dir = tempfile::tempdir().unwrap();
        let api = FileSourceApi::new(dir.path().join("remote").join("sources.json"));
        (dir, api)
    }

    #[tokio::test]
    async fn create_assigns_an_id() {
        let (_dir, api) = api();
        let created = api.create_source(WireObject::tagged("MYSQL")).await.unwrap();
        let id = created.id().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&id).is_ok());

        let stored = api.get_source(&id).await.unwrap().unwrap();
        assert_eq!(stored["type"], json!("MYSQL"));
    }

    #[tokio::test]
    async fn create_requires_type() {
        let (_dir, api) = api();
        let result = api.create_source(WireObject::new()).await;
        assert!(matches!(result, Err(ApiError::Rejected { status: 400, .. })));
    }

    #[tokio::test]
    async fn update_keeps_type_when_omitted() {
        let (_dir, api) = api();
        let created = api.create_source(WireObject::tagged("DBT")).await.unwrap();
        let id = created.id().unwrap().to_string();

        let mut body = WireObject::new();
        body.insert("target", json!("staging"));
        let updated = api.update_source(&id, body).await.unwrap();
        assert_eq!(updated.discriminator(), Some("DBT"));
        assert_eq!(updated.get("target"), Some(&json!("staging")));
    }

    #[tokio::test]
    async fn update_refuses_type_change() {
        let (_dir, api) = api();
        let created = api.create_source(WireObject::tagged("MYSQL")).await.unwrap();
        let id = created.id().unwrap().to_string();

        let result = api.update_source(&id, WireObject::tagged("TABLEAU")).await;
        assert!(matches!(result, Err(ApiError::Rejected { status: 409, .. })));
    }

    #[tokio::test]
    async fn missing_sources() {
        let (_dir, api) = api();
        assert!(api.get_source("nope").await.unwrap().is_none());
        assert!(matches!(
            api.delete_source("nope").await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            api.update_source("nope", WireObject::tagged("MYSQL")).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
