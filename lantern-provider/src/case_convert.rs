//! Case conversion between configuration and wire names
//!
//! Configuration uses snake_case (e.g., `project_id`, `billing_project_id`)
//! The remote API uses lowerCamelCase (e.g., `projectId`, `billingProjectId`)
//!
//! Variant discriminators are lowercase in configuration (`dbtcloud`) and
//! upper snake case on the wire (`DBT_CLOUD`).

use std::collections::HashMap;

use heck::{ToLowerCamelCase, ToSnakeCase};
use lantern_core::resource::Value;

/// Convert a configuration field name to its wire key
/// e.g., "billing_project_id" -> "billingProjectId"
pub fn to_wire_key(field: &str) -> String {
    field.to_lower_camel_case()
}

/// Convert a wire key to its configuration field name
/// e.g., "billingProjectId" -> "billing_project_id"
pub fn to_config_key(key: &str) -> String {
    key.to_snake_case()
}

/// Canonical registry name for a discriminator in any casing
/// e.g., "DBT_CLOUD" -> "dbtcloud", "BigQuery" -> "bigquery"
pub fn canonical_variant_name(discriminator: &str) -> String {
    discriminator
        .chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Convert nested wire attributes to configuration keys, recursing into lists and maps
pub fn attributes_to_config(attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
    attributes
        .iter()
        .map(|(k, v)| (to_config_key(k), value_to_config(v)))
        .collect()
}

fn value_to_config(value: &Value) -> Value {
    match value {
        Value::Map(map) => Value::Map(attributes_to_config(map)),
        Value::List(items) => Value::List(items.iter().map(value_to_config).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wire_key() {
        assert_eq!(to_wire_key("project_id"), "projectId");
        assert_eq!(to_wire_key("billing_project_id"), "billingProjectId");
        assert_eq!(to_wire_key("s3_output_location"), "s3OutputLocation");
        assert_eq!(to_wire_key("host"), "host");
    }

    #[test]
    fn test_to_config_key() {
        assert_eq!(to_config_key("projectId"), "project_id");
        assert_eq!(to_config_key("billingProjectId"), "billing_project_id");
        assert_eq!(to_config_key("host"), "host");
    }

    #[test]
    fn test_canonical_variant_name() {
        assert_eq!(canonical_variant_name("BIGQUERY"), "bigquery");
        assert_eq!(canonical_variant_name("bigquery"), "bigquery");
        assert_eq!(canonical_variant_name("DBT_CLOUD"), "dbtcloud");
        assert_eq!(canonical_variant_name("power-bi"), "powerbi");
    }

    #[test]
    fn test_nested_conversion() {
        let connection = Value::Map(HashMap::from([
            ("url".to_string(), Value::string("git@example.com:org/repo.git")),
            ("authType".to_string(), Value::string("SSH_KEY")),
        ]));
        let wire = HashMap::from([(
            "gitConnections".to_string(),
            Value::List(vec![connection]),
        )]);

        let config = attributes_to_config(&wire);
        let Some(Value::List(items)) = config.get("git_connections") else {
            panic!("Expected git_connections list");
        };
        let Some(Value::Map(first)) = items.first() else {
            panic!("Expected connection map");
        };
        assert_eq!(first.get("auth_type"), Some(&Value::string("SSH_KEY")));
        assert_eq!(first.get("url"), Some(&Value::string("git@example.com:org/repo.git")));
    }
}
