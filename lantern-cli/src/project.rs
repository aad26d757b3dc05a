//! Project file (`lantern.json`)

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use lantern_core::resource::{Resource, Value};
use lantern_provider::SOURCE_RESOURCE_TYPE;
use lantern_provider::wire::json_to_value;
use lantern_state::BackendConfig;

pub const DEFAULT_PROJECT_FILE: &str = "lantern.json";
const DEFAULT_STATE_PATH: &str = ".lantern/state.json";
const DEFAULT_REMOTE_PATH: &str = ".lantern/remote.json";

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    /// Directory the project file lives in; relative paths resolve against it
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSection {
    #[serde(rename = "type")]
    pub backend_type: String,
    pub path: Option<String>,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            backend_type: "local".to_string(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
    pub description: Option<String>,
    pub timezone: Option<String>,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl SourceConfig {
    pub fn to_resource(&self) -> Resource {
        let mut resource = Resource::new(SOURCE_RESOURCE_TYPE, &self.name)
            .with_attribute("name", Value::string(&self.name));
        if let Some(description) = &self.description {
            resource = resource.with_attribute("description", Value::string(description));
        }
        if let Some(timezone) = &self.timezone {
            resource = resource.with_attribute("timezone", Value::string(timezone));
        }
        let parameters = json_to_value(&self.parameters).unwrap_or(Value::Null);
        resource.with_attribute("parameters", parameters)
    }
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let mut project: ProjectConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
        project.base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        project.check_sources()?;
        Ok(project)
    }

    fn check_sources(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.name.as_str()) {
                return Err(format!("Source '{}' is declared twice", source.name));
            }
            if json_to_value(&source.parameters).is_none() {
                return Err(format!(
                    "Source '{}': parameters may only hold whole numbers",
                    source.name
                ));
            }
        }
        Ok(())
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            backend_type: self.backend.backend_type.clone(),
            path: Some(self.resolve(self.backend.path.as_deref().unwrap_or(DEFAULT_STATE_PATH))),
        }
    }

    pub fn remote_path(&self) -> PathBuf {
        self.resolve(self.remote.path.as_deref().unwrap_or(DEFAULT_REMOTE_PATH))
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.sources.iter().map(SourceConfig::to_resource).collect()
    }
}
