//! Provider - the seam between planning and a remote system
//!
//! Planning only needs `modify_plan`, which is synchronous and never touches
//! the network. Reads and mutations go through boxed futures so that the
//! trait stays object safe.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

type Cause = Box<dyn StdError + Send + Sync>;

/// Failure reported by a provider, optionally tied to one resource
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Cause>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        ProviderError {
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    /// Attach the resource the error is about; an existing one is kept
    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id.get_or_insert(id);
        self
    }

    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource_id {
            Some(id) => write!(f, "[{}] {}", id, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for ProviderError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn StdError + 'static))
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A resource type served by a provider
pub trait ResourceType: Send + Sync {
    fn name(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name())
    }
}

/// Lifecycle operations for the resource types of one remote system
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Complete a desired resource before it is diffed against `current`
    ///
    /// Computed attributes that cannot be derived yet must be left
    /// `Value::Unknown` rather than reported as errors.
    fn modify_plan(&self, _desired: &mut Resource, _current: &State) -> ProviderResult<()> {
        Ok(())
    }

    /// Look up a resource by its remote identifier
    ///
    /// A resource that no longer exists yields `State::not_found`, not an error.
    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Returned state carries the identifier assigned by the remote system
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>>;
}
