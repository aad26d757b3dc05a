//! On-disk record of the sources Lantern manages
//!
//! Records are kept sorted by resource type and name, so a state file
//! written twice with the same content is byte-identical.

use std::cmp::Ordering;
use std::collections::HashMap;

use lantern_core::resource::ResourceId;
use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, BackendResult};

/// Newest state format this build reads and writes
pub const STATE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    /// Bumped before every write
    pub serial: u64,
    /// Fixed at creation; backends refuse to overwrite a file of another lineage
    pub lineage: String,
    /// Lantern release that performed the last write
    pub lantern_version: String,
    #[serde(default)]
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    pub fn new() -> Self {
        StateFile {
            version: STATE_FORMAT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            lantern_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    /// Check a freshly loaded file and restore record order
    pub fn validate(mut self) -> BackendResult<Self> {
        if self.version > STATE_FORMAT_VERSION {
            return Err(BackendError::InvalidState(format!(
                "format version {} was written by a newer Lantern (this build reads up to {})",
                self.version, STATE_FORMAT_VERSION
            )));
        }
        self.resources.sort_by(|a, b| a.key_cmp(&b.resource_type, &b.name));
        if let Some(pair) = self
            .resources
            .windows(2)
            .find(|pair| pair[0].key_cmp(&pair[1].resource_type, &pair[1].name).is_eq())
        {
            return Err(BackendError::InvalidState(format!(
                "'{}' is recorded more than once",
                pair[0].id()
            )));
        }
        Ok(self)
    }

    /// Stamp the file for its next write
    pub fn next_serial(&mut self) {
        self.serial += 1;
        self.lantern_version = env!("CARGO_PKG_VERSION").to_string();
    }

    fn position(&self, id: &ResourceId) -> Result<usize, usize> {
        self.resources
            .binary_search_by(|r| r.key_cmp(&id.resource_type, &id.name))
    }

    pub fn get(&self, id: &ResourceId) -> Option<&ResourceState> {
        self.position(id).ok().map(|index| &self.resources[index])
    }

    /// Store `resource`, replacing any record with the same id
    ///
    /// Returns whether the stored record changed.
    pub fn record(&mut self, resource: ResourceState) -> bool {
        match self.position(&resource.id()) {
            Ok(index) if self.resources[index] == resource => false,
            Ok(index) => {
                self.resources[index] = resource;
                true
            }
            Err(index) => {
                self.resources.insert(index, resource);
                true
            }
        }
    }

    pub fn forget(&mut self, id: &ResourceId) -> Option<ResourceState> {
        let index = self.position(id).ok()?;
        Some(self.resources.remove(index))
    }
}

impl Default for StateFile {
    fn default() -> Self {
        StateFile::new()
    }
}

/// Last known state of one managed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub resource_type: String,
    pub name: String,
    pub provider: String,
    /// Id assigned by the remote API; absent until the create succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Attributes as read back from the remote
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ResourceState {
    pub fn new(id: &ResourceId, provider: impl Into<String>) -> Self {
        ResourceState {
            resource_type: id.resource_type.clone(),
            name: id.name.clone(),
            provider: provider.into(),
            identifier: None,
            attributes: HashMap::new(),
        }
    }

    pub fn id(&self) -> ResourceId {
        ResourceId::new(&self.resource_type, &self.name)
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    fn key_cmp(&self, resource_type: &str, name: &str) -> Ordering {
        (self.resource_type.as_str(), self.name.as_str()).cmp(&(resource_type, name))
    }
}
