//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the "desired state" declared in configuration with the "current state"
//! known for the remote system, and generates a list of required Effects (Plan).
//! A change to an attribute marked `requires_replace` in the resource schema turns
//! the update into a destroy-and-recreate.

use std::collections::{HashMap, HashSet};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with a difference that cannot be applied in place
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
        replace_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
    /// Resource exists but not in desired state -> needs deletion
    Delete(ResourceId),
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State, schema: Option<&ResourceSchema>) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes, schema);

    if changed.is_empty() {
        return Diff::NoChange(desired.id.clone());
    }

    let replace_attributes = schema
        .map(|s| find_replace_attributes(s, &changed, desired))
        .unwrap_or_default();

    if replace_attributes.is_empty() {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    } else {
        Diff::Replace {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
            replace_attributes,
        }
    }
}

/// Find changed attributes between desired and current state
///
/// An attribute present in state but dropped from configuration is changed,
/// unless it is internal (`_` prefix), computed by the provider, or null.
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
    schema: Option<&ResourceSchema>,
) -> Vec<String> {
    let is_computed = |key: &str| {
        schema
            .and_then(|s| s.attributes.get(key))
            .is_some_and(|a| a.computed)
    };

    let mut changed: Vec<String> = desired
        .iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .filter(|(key, desired_value)| match current.get(*key) {
            Some(current_value) => current_value != *desired_value,
            None => !desired_value.is_null(),
        })
        .map(|(key, _)| key.clone())
        .collect();

    changed.extend(
        current
            .iter()
            .filter(|(key, value)| {
                !key.starts_with('_')
                    && !desired.contains_key(*key)
                    && !value.is_null()
                    && !is_computed(key.as_str())
            })
            .map(|(key, _)| key.clone()),
    );

    changed.sort();
    changed
}

/// Changed attributes that force replacement
///
/// An attribute whose desired value is still unknown cannot be compared yet, so it
/// never forces replacement at plan time.
fn find_replace_attributes(
    schema: &ResourceSchema,
    changed: &[String],
    desired: &Resource,
) -> Vec<String> {
    let mut replace: Vec<String> = schema
        .requires_replace_attributes()
        .filter(|a| changed.contains(&a.name))
        .filter(|a| {
            let known = desired
                .attributes
                .get(&a.name)
                .is_some_and(Value::is_wholly_known);
            if !known {
                log::warn!(
                    "{}: '{}' is not known yet; replacement is decided at apply time",
                    desired.id,
                    a.name
                );
            }
            known
        })
        .map(|a| a.name.clone())
        .collect();
    replace.sort();
    replace
}

/// Compute Diff for multiple resources and generate a Plan
///
/// Current states without a desired counterpart are planned for deletion.
pub fn create_plan(
    desired: &[Resource],
    current_states: &HashMap<ResourceId, State>,
    schemas: &HashMap<String, ResourceSchema>,
) -> Plan {
    let mut plan = Plan::new();

    for resource in desired {
        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        let d = diff(resource, &current, schemas.get(&resource.id.resource_type));

        match d {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update { id, from, to, .. } => {
                plan.add(Effect::Update { id, from, to });
            }
            Diff::Replace {
                id,
                from,
                to,
                replace_attributes,
                ..
            } => plan.add(Effect::Replace {
                id,
                from,
                to,
                reasons: replace_attributes,
            }),
            Diff::NoChange(_) => {}
            Diff::Delete(_) => {}
        }
    }

    let desired_ids: HashSet<&ResourceId> = desired.iter().map(|r| &r.id).collect();
    let mut orphaned: Vec<&State> = current_states
        .values()
        .filter(|s| s.exists && !desired_ids.contains(&s.id))
        .collect();
    orphaned.sort_by(|a, b| a.id.name.cmp(&b.id.name));

    for state in orphaned {
        if let Some(identifier) = &state.identifier {
            plan.add(Effect::Delete {
                id: state.id.clone(),
                identifier: identifier.clone(),
            });
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSchema, AttributeType};

    fn source_schema() -> ResourceSchema {
        ResourceSchema::new("source")
            .attribute(AttributeSchema::new("id", AttributeType::String).computed())
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("description", AttributeType::String))
            .attribute(AttributeSchema::new("timezone", AttributeType::String))
            .attribute(
                AttributeSchema::new("variant_name", AttributeType::String)
                    .computed()
                    .requires_replace(),
            )
    }

    fn existing(attrs: &[(&str, Value)]) -> State {
        let attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        State::existing(ResourceId::new("source", "test"), attrs).with_identifier("id-1")
    }

    #[test]
    fn diff_create_when_not_exists() {
        let desired = Resource::new("source", "test");
        let current = State::not_found(ResourceId::new("source", "test"));

        let result = diff(&desired, &current, None);
        assert!(matches!(result, Diff::Create(_)));
    }

    #[test]
    fn diff_no_change_when_same() {
        let desired =
            Resource::new("source", "test").with_attribute("timezone", Value::string("UTC"));
        let current = existing(&[("timezone", Value::string("UTC"))]);

        let result = diff(&desired, &current, Some(&source_schema()));
        assert!(matches!(result, Diff::NoChange(_)));
    }

    #[test]
    fn diff_update_when_different() {
        let desired = Resource::new("source", "test")
            .with_attribute("timezone", Value::string("Europe/Paris"))
            .with_attribute("variant_name", Value::string("mysql"));
        let current = existing(&[
            ("timezone", Value::string("UTC")),
            ("variant_name", Value::string("mysql")),
        ]);

        match diff(&desired, &current, Some(&source_schema())) {
            Diff::Update {
                changed_attributes, ..
            } => {
                assert_eq!(changed_attributes, vec!["timezone".to_string()]);
            }
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn diff_update_when_attribute_removed_from_configuration() {
        let desired = Resource::new("source", "test")
            .with_attribute("name", Value::string("test"))
            .with_attribute("variant_name", Value::string("mysql"));
        let current = existing(&[
            ("id", Value::string("id-1")),
            ("name", Value::string("test")),
            ("description", Value::string("old")),
            ("timezone", Value::string("UTC")),
            ("variant_name", Value::string("mysql")),
            ("_etag", Value::string("abc")),
        ]);

        match diff(&desired, &current, Some(&source_schema())) {
            Diff::Update {
                changed_attributes, ..
            } => assert_eq!(
                changed_attributes,
                vec!["description".to_string(), "timezone".to_string()]
            ),
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn diff_ignores_computed_and_null_attributes_missing_from_desired() {
        let desired = Resource::new("source", "test").with_attribute("name", Value::string("test"));
        let current = existing(&[
            ("id", Value::string("id-1")),
            ("name", Value::string("test")),
            ("variant_name", Value::string("mysql")),
            ("description", Value::Null),
        ]);

        assert!(matches!(
            diff(&desired, &current, Some(&source_schema())),
            Diff::NoChange(_)
        ));
    }

    #[test]
    fn diff_replace_when_requires_replace_attribute_changes() {
        let desired = Resource::new("source", "test")
            .with_attribute("variant_name", Value::string("tableau"));
        let current = existing(&[("variant_name", Value::string("mysql"))]);

        match diff(&desired, &current, Some(&source_schema())) {
            Diff::Replace {
                replace_attributes, ..
            } => assert_eq!(replace_attributes, vec!["variant_name".to_string()]),
            other => panic!("Expected Replace, got {:?}", other),
        }
    }

    #[test]
    fn diff_unknown_requires_replace_attribute_is_update() {
        let desired =
            Resource::new("source", "test").with_attribute("variant_name", Value::Unknown);
        let current = existing(&[("variant_name", Value::string("mysql"))]);

        assert!(matches!(
            diff(&desired, &current, Some(&source_schema())),
            Diff::Update { .. }
        ));
    }

    #[test]
    fn diff_without_schema_never_replaces() {
        let desired = Resource::new("source", "test")
            .with_attribute("variant_name", Value::string("tableau"));
        let current = existing(&[("variant_name", Value::string("mysql"))]);

        assert!(matches!(diff(&desired, &current, None), Diff::Update { .. }));
    }

    #[test]
    fn create_plan_from_resources() {
        let resources = vec![
            Resource::new("source", "new-source"),
            Resource::new("source", "existing-source")
                .with_attribute("timezone", Value::string("UTC")),
        ];

        let mut current_states = HashMap::new();
        let mut attrs = HashMap::new();
        attrs.insert("timezone".to_string(), Value::string("Europe/Paris"));
        current_states.insert(
            ResourceId::new("source", "existing-source"),
            State::existing(ResourceId::new("source", "existing-source"), attrs),
        );
        current_states.insert(
            ResourceId::new("source", "removed-source"),
            State::existing(ResourceId::new("source", "removed-source"), HashMap::new())
                .with_identifier("id-removed"),
        );

        let schemas = HashMap::from([("source".to_string(), source_schema())]);
        let plan = create_plan(&resources, &current_states, &schemas);

        assert_eq!(plan.effects().len(), 3);
        assert!(matches!(plan.effects()[0], Effect::Create(_)));
        assert!(matches!(plan.effects()[1], Effect::Update { .. }));
        assert!(matches!(
            &plan.effects()[2],
            Effect::Delete { identifier, .. } if identifier == "id-removed"
        ));
    }
}
