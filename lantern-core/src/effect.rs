//! Effect - A single side effect a provider performs when a plan is applied

use crate::resource::{Resource, ResourceId, State};

/// Side effect to be executed against the remote system
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Refresh the state of a resource
    Read(ResourceId),
    /// Create a resource that does not exist yet
    Create(Resource),
    /// Change an existing resource in place
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    /// Destroy an existing resource and create it again from the desired state
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
        /// Attributes that forced the replacement
        reasons: Vec<String>,
    },
    /// Destroy a resource that is no longer desired
    Delete { id: ResourceId, identifier: String },
}

impl Effect {
    /// Returns whether this Effect mutates the remote system
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(id) => id,
            Effect::Create(r) => &r.id,
            Effect::Update { id, .. } | Effect::Replace { id, .. } | Effect::Delete { id, .. } => {
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_is_not_mutating() {
        let id = ResourceId::new("source", "a");
        assert!(!Effect::Read(id.clone()).is_mutating());
        assert!(Effect::Create(Resource::new("source", "a")).is_mutating());
        let delete = Effect::Delete {
            id,
            identifier: "4f0c".to_string(),
        };
        assert!(delete.is_mutating());
        assert_eq!(delete.resource_id(), &ResourceId::new("source", "a"));
    }
}
