//! Parameter container
//!
//! The `parameters` block of a source holds one slot per registered variant, at
//! most one of which is set. The container keeps those raw slots as they came
//! from configuration and, once resolved, the decoded `ResolvedParameters` of
//! the one slot that is set. Resolution happens once; later calls return the
//! cached result.

use std::collections::{BTreeMap, HashMap};

use lantern_core::resource::Value;

use crate::case_convert::canonical_variant_name;
use crate::error::{ParameterError, ParameterResult};
use crate::parameters::{CommonFields, ResolvedParameters, VariantParameters};
use crate::registry::VariantRegistry;
use crate::wire::WireObject;

#[derive(Debug, Clone)]
pub struct ParameterContainer<'r> {
    registry: &'r VariantRegistry,
    slots: BTreeMap<&'static str, Value>,
    active: Option<ResolvedParameters>,
}

impl<'r> ParameterContainer<'r> {
    /// A container with every slot null
    pub fn empty(registry: &'r VariantRegistry) -> Self {
        Self::filled(registry, Value::Null)
    }

    fn filled(registry: &'r VariantRegistry, value: Value) -> Self {
        Self {
            registry,
            slots: registry
                .all_names()
                .map(|name| (name, value.clone()))
                .collect(),
            active: None,
        }
    }

    /// Build a container from the `parameters` block of a configuration
    ///
    /// Keys must be registered variant names. A block that is not known yet
    /// produces a container whose every slot is unknown.
    pub fn from_config(registry: &'r VariantRegistry, block: &Value) -> ParameterResult<Self> {
        let fields = match block {
            Value::Map(fields) => fields,
            Value::Null => return Ok(Self::empty(registry)),
            Value::Unknown => return Ok(Self::filled(registry, Value::Unknown)),
            other => {
                return Err(ParameterError::invalid_configuration(
                    "parameters",
                    "parameters",
                    format!("expected a block, got {:?}", other),
                ));
            }
        };

        let mut container = Self::empty(registry);
        for (key, value) in fields {
            let name = registry.descriptor(key)?.name;
            container.slots.insert(name, value.clone());
        }
        Ok(container)
    }

    pub fn registry(&self) -> &'r VariantRegistry {
        self.registry
    }

    /// Raw value of one slot
    pub fn slot(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// Names of the slots holding a known, non-null value
    pub fn populated_slots(&self) -> Vec<&'static str> {
        self.slots
            .iter()
            .filter(|(_, value)| !value.is_null() && !value.is_unknown())
            .map(|(name, _)| *name)
            .collect()
    }

    fn unknown_slot(&self) -> Option<&'static str> {
        self.slots
            .iter()
            .find(|(_, value)| value.is_unknown())
            .map(|(name, _)| *name)
    }

    /// Which slot is set, without decoding it
    ///
    /// A slot whose own value is unknown makes the answer unknown
    /// (`UnresolvedVariant`); unknown fields inside the set slot do not.
    pub fn active_name(&self) -> ParameterResult<&'static str> {
        if let Some(active) = &self.active {
            return Ok(active.name());
        }

        let populated = self.populated_slots();
        if populated.len() > 1 {
            return Err(ParameterError::AmbiguousVariant {
                set: populated.iter().map(|s| s.to_string()).collect(),
                valid: self.registry.valid_names(),
            });
        }
        if let Some(slot) = self.unknown_slot() {
            return Err(ParameterError::UnresolvedVariant {
                slot: slot.to_string(),
            });
        }
        populated
            .first()
            .copied()
            .ok_or_else(|| ParameterError::NoVariantSet {
                valid: self.registry.valid_names(),
            })
    }

    /// Name of the resolved variant, if resolution has happened
    pub fn active_variant_name(&self) -> Option<&'static str> {
        self.active.as_ref().map(|a| a.name())
    }

    /// The decoded parameters of the one slot that is set
    ///
    /// Fails when no slot or several slots are set. The first success is
    /// cached, so repeated calls return the same parameters.
    pub fn resolve_active(&mut self) -> ParameterResult<&ResolvedParameters> {
        let parameters = match self.active.take() {
            Some(parameters) => parameters,
            None => self.decode_active()?,
        };
        let active: &ResolvedParameters = self.active.insert(parameters);
        Ok(active)
    }

    fn decode_active(&self) -> ParameterResult<ResolvedParameters> {
        let name = self.active_name()?;
        let block = self
            .slots
            .get(name)
            .ok_or_else(|| ParameterError::NoVariantSet {
                valid: self.registry.valid_names(),
            })?;
        let parameters = self.registry.create(name)?.decode_from_config(block)?;
        log::debug!("resolved source parameters to '{}'", name);
        Ok(parameters)
    }

    /// Make `parameters` the only set slot
    pub fn set_active(&mut self, parameters: ResolvedParameters) {
        for value in self.slots.values_mut() {
            *value = Value::Null;
        }
        self.slots.insert(parameters.name(), parameters.to_config());
        self.active = Some(parameters);
    }

    /// The resolved parameters, if any
    pub fn active(&self) -> Option<&ResolvedParameters> {
        self.active.as_ref()
    }

    pub fn to_create_request(&mut self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        self.resolve_active()?.encode_create_request(common)
    }

    pub fn to_update_request(&mut self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        self.resolve_active()?.encode_update_request(common)
    }

    /// Rebuild a container from a remote response
    ///
    /// The discriminator may use any casing or separator style; it is
    /// normalised before the registry lookup.
    pub fn from_wire_response(
        registry: &'r VariantRegistry,
        discriminator: &str,
        response: &WireObject,
    ) -> ParameterResult<Self> {
        let name = canonical_variant_name(discriminator);
        if !registry.contains(&name) {
            return Err(ParameterError::UnsupportedRemoteVariant {
                discriminator: discriminator.to_string(),
                valid: registry.valid_names(),
            });
        }

        let parameters = registry.create(&name)?.decode_from_wire(response)?;
        let mut container = Self::empty(registry);
        container.set_active(parameters);
        Ok(container)
    }

    /// The `parameters` block, one entry per slot
    pub fn to_config(&self) -> Value {
        let slots: HashMap<String, Value> = self
            .slots
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        Value::Map(slots)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::parameters::tests::{sample_config, sample_wire};
    use crate::registry::registry;

    fn parameters_block(slots: Vec<(&str, Value)>) -> Value {
        Value::Map(slots.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn empty_container_has_no_variant() {
        let container = ParameterContainer::empty(registry());
        assert!(container.populated_slots().is_empty());
        match container.active_name() {
            Err(ParameterError::NoVariantSet { valid }) => assert_eq!(valid.len(), 18),
            other => panic!("expected NoVariantSet, got {:?}", other),
        }
    }

    #[test]
    fn resolve_fails_when_nothing_is_set() {
        let block = parameters_block(vec![("bigquery", Value::Null)]);
        let mut container = ParameterContainer::from_config(registry(), &block).unwrap();
        assert!(matches!(
            container.resolve_active(),
            Err(ParameterError::NoVariantSet { .. })
        ));
        assert_eq!(container.active_variant_name(), None);
    }

    #[test]
    fn resolve_fails_when_two_are_set() {
        let block = parameters_block(vec![
            ("bigquery", sample_config("bigquery")),
            ("snowflake", sample_config("snowflake")),
        ]);
        let mut container = ParameterContainer::from_config(registry(), &block).unwrap();
        match container.resolve_active() {
            Err(ParameterError::AmbiguousVariant { set, valid }) => {
                assert_eq!(set, vec!["bigquery", "snowflake"]);
                assert_eq!(valid.len(), 18);
            }
            other => panic!("expected AmbiguousVariant, got {:?}", other),
        }
    }

    #[test]
    fn from_config_rejects_unregistered_slot() {
        let block = parameters_block(vec![("clickhouse", Value::Map(HashMap::new()))]);
        assert!(matches!(
            ParameterContainer::from_config(registry(), &block),
            Err(ParameterError::UnknownVariant { name, .. }) if name == "clickhouse"
        ));
    }

    #[test]
    fn resolution_is_idempotent() {
        let block = parameters_block(vec![("mysql", sample_config("mysql"))]);
        let mut container = ParameterContainer::from_config(registry(), &block).unwrap();
        let slots_before = container.to_config();

        let first = container.resolve_active().unwrap().clone();
        let second = container.resolve_active().unwrap().clone();

        assert_eq!(first, second);
        assert_eq!(first.name(), "mysql");
        assert_eq!(container.active_variant_name(), Some("mysql"));
        assert_eq!(container.to_config(), slots_before);
    }

    #[test]
    fn set_active_leaves_exactly_one_slot() {
        let mut container = ParameterContainer::from_config(
            registry(),
            &parameters_block(vec![
                ("bigquery", sample_config("bigquery")),
                ("tableau", sample_config("tableau")),
            ]),
        )
        .unwrap();

        for empty in ResolvedParameters::all_empty() {
            let parameters = empty.decode_from_config(&sample_config(empty.name())).unwrap();
            container.set_active(parameters);
            assert_eq!(container.populated_slots(), vec![empty.name()]);
            assert_eq!(container.active_name().unwrap(), empty.name());
        }
    }

    #[test]
    fn unknown_slot_defers_the_choice() {
        let block = parameters_block(vec![("athena", Value::Unknown)]);
        let container = ParameterContainer::from_config(registry(), &block).unwrap();
        assert_eq!(
            container.active_name(),
            Err(ParameterError::UnresolvedVariant {
                slot: "athena".to_string()
            })
        );

        let whole = ParameterContainer::from_config(registry(), &Value::Unknown).unwrap();
        assert!(matches!(
            whole.active_name(),
            Err(ParameterError::UnresolvedVariant { .. })
        ));
    }

    #[test]
    fn unknown_field_still_names_the_variant() {
        let mut bigquery = sample_config("bigquery");
        if let Value::Map(fields) = &mut bigquery {
            fields.insert("dataset_id".to_string(), Value::Unknown);
        }
        let block = parameters_block(vec![("bigquery", bigquery)]);
        let mut container = ParameterContainer::from_config(registry(), &block).unwrap();

        assert_eq!(container.active_name().unwrap(), "bigquery");
        assert!(matches!(
            container.resolve_active(),
            Err(ParameterError::InvalidConfiguration { field, .. }) if field == "dataset_id"
        ));
    }

    #[test]
    fn wire_discriminator_is_case_insensitive() {
        let response = sample_wire("bigquery");
        let upper =
            ParameterContainer::from_wire_response(registry(), "BIGQUERY", &response).unwrap();
        let lower =
            ParameterContainer::from_wire_response(registry(), "bigquery", &response).unwrap();
        assert_eq!(upper.active_variant_name(), Some("bigquery"));
        assert_eq!(upper.active(), lower.active());

        let response = sample_wire("dbtcloud");
        let container =
            ParameterContainer::from_wire_response(registry(), "DBT_CLOUD", &response).unwrap();
        assert_eq!(container.active_variant_name(), Some("dbtcloud"));
    }

    #[test]
    fn unsupported_remote_variant() {
        let response = WireObject::parse(r#"{"type":"CLICKHOUSE","name":"ch"}"#).unwrap();
        match ParameterContainer::from_wire_response(registry(), "CLICKHOUSE", &response) {
            Err(ParameterError::UnsupportedRemoteVariant { discriminator, valid }) => {
                assert_eq!(discriminator, "CLICKHOUSE");
                assert!(valid.contains(&"bigquery".to_string()));
            }
            other => panic!("expected UnsupportedRemoteVariant, got {:?}", other),
        }
    }

    #[test]
    fn bigquery_create_request_end_to_end() {
        let block = parameters_block(vec![(
            "bigquery",
            parameters_block(vec![
                ("project_id", Value::string("p1")),
                ("billing_project_id", Value::string("b1")),
                ("credentials", Value::string("cred-name")),
            ]),
        )]);
        let mut container = ParameterContainer::from_config(registry(), &block).unwrap();

        let body = container
            .to_create_request(&CommonFields::new("src1", Some("UTC")))
            .unwrap();
        assert_eq!(body.discriminator(), Some("BIGQUERY"));
        assert_eq!(body.get("projectId"), Some(&json!("p1")));
        assert_eq!(body.get("billingProjectId"), Some(&json!("b1")));
        assert_eq!(body.get("timezone"), Some(&json!("UTC")));

        let decoded =
            ParameterContainer::from_wire_response(registry(), "BIGQUERY", &body).unwrap();
        match decoded.active() {
            Some(ResolvedParameters::BigQuery(parameters)) => {
                assert_eq!(parameters.project_id, "p1");
                assert_eq!(parameters.billing_project_id.as_deref(), Some("b1"));
            }
            other => panic!("expected bigquery parameters, got {:?}", other),
        }
    }

    #[test]
    fn update_request_uses_update_shape() {
        let block = parameters_block(vec![("dbt", sample_config("dbt"))]);
        let mut container = ParameterContainer::from_config(registry(), &block).unwrap();
        let common = CommonFields::new("dbt", None);

        assert!(container.to_create_request(&common).unwrap().discriminator().is_some());
        assert!(container.to_update_request(&common).unwrap().discriminator().is_none());
    }
}
