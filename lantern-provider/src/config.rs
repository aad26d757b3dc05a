//! Access to structured configuration blocks
//!
//! The configuration layer hands the provider `Value`s; this module turns a
//! nested block into typed fields and reports shape problems as errors instead
//! of panicking.

use std::collections::HashMap;

use lantern_core::resource::Value;

use crate::error::{ParameterError, ParameterResult};

/// A block looked up by path in a resource's attributes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StructuredBlock<'a> {
    /// The attribute is not present at all
    Absent,
    /// The attribute is present and explicitly null
    Null,
    /// The attribute's value is not known until apply
    Unknown,
    /// The attribute holds a value (possibly an empty map)
    Present(&'a Value),
}

/// Look up a top-level block, distinguishing absent and null from an empty block
pub fn get_structured_block<'a>(
    attributes: &'a HashMap<String, Value>,
    path: &str,
) -> StructuredBlock<'a> {
    match attributes.get(path) {
        None => StructuredBlock::Absent,
        Some(Value::Null) => StructuredBlock::Null,
        Some(Value::Unknown) => StructuredBlock::Unknown,
        Some(value) => StructuredBlock::Present(value),
    }
}

/// Typed field access on one variant's configuration block
pub struct ConfigBlock<'a> {
    variant: &'static str,
    fields: &'a HashMap<String, Value>,
}

impl<'a> ConfigBlock<'a> {
    /// Open a block, which must be a map
    pub fn new(variant: &'static str, block: &'a Value) -> ParameterResult<Self> {
        match block {
            Value::Map(fields) => Ok(Self { variant, fields }),
            other => Err(ParameterError::invalid_configuration(
                variant,
                variant,
                format!("expected a block, got {:?}", other),
            )),
        }
    }

    fn field(&self, field: &str) -> ParameterResult<Option<&'a Value>> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Unknown) => Err(ParameterError::invalid_configuration(
                self.variant,
                field,
                "value is not known yet",
            )),
            Some(value) => Ok(Some(value)),
        }
    }

    fn missing(&self, field: &str) -> ParameterError {
        ParameterError::invalid_configuration(self.variant, field, "required field is missing")
    }

    fn mismatch(&self, field: &str, expected: &str, got: &Value) -> ParameterError {
        ParameterError::invalid_configuration(
            self.variant,
            field,
            format!("expected {}, got {:?}", expected, got),
        )
    }

    pub fn required_string(&self, field: &str) -> ParameterResult<String> {
        self.optional_string(field)?
            .ok_or_else(|| self.missing(field))
    }

    pub fn optional_string(&self, field: &str) -> ParameterResult<Option<String>> {
        match self.field(field)? {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.mismatch(field, "a string", other)),
        }
    }

    pub fn required_int(&self, field: &str) -> ParameterResult<i64> {
        self.optional_int(field)?.ok_or_else(|| self.missing(field))
    }

    pub fn optional_int(&self, field: &str) -> ParameterResult<Option<i64>> {
        match self.field(field)? {
            None => Ok(None),
            Some(Value::Int(n)) => Ok(Some(*n)),
            Some(other) => Err(self.mismatch(field, "an integer", other)),
        }
    }

    pub fn optional_bool(&self, field: &str) -> ParameterResult<Option<bool>> {
        match self.field(field)? {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.mismatch(field, "a boolean", other)),
        }
    }

    /// A list of strings; absent reads as empty
    pub fn string_list(&self, field: &str) -> ParameterResult<Vec<String>> {
        match self.field(field)? {
            None => Ok(Vec::new()),
            Some(Value::List(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(self.mismatch(field, "a list of strings", other)),
                })
                .collect(),
            Some(other) => Err(self.mismatch(field, "a list of strings", other)),
        }
    }

    /// A list of nested blocks; absent reads as empty
    pub fn block_list(&self, field: &str) -> ParameterResult<Vec<HashMap<String, Value>>> {
        match self.field(field)? {
            None => Ok(Vec::new()),
            Some(Value::List(items)) => items
                .iter()
                .map(|item| match item {
                    Value::Map(map) if map.values().all(Value::is_wholly_known) => {
                        Ok(map.clone())
                    }
                    Value::Map(_) => Err(ParameterError::invalid_configuration(
                        self.variant,
                        field,
                        "value is not known yet",
                    )),
                    other => Err(self.mismatch(field, "a list of blocks", other)),
                })
                .collect(),
            Some(other) => Err(self.mismatch(field, "a list of blocks", other)),
        }
    }
}

/// Builder for the configuration form of a variant (the inverse of `ConfigBlock`)
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    fields: HashMap<String, Value>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(mut self, field: &str, value: &str) -> Self {
        self.fields
            .insert(field.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn optional_string(mut self, field: &str, value: Option<&str>) -> Self {
        let value = value.map_or(Value::Null, |v| Value::String(v.to_string()));
        self.fields.insert(field.to_string(), value);
        self
    }

    pub fn int(mut self, field: &str, value: i64) -> Self {
        self.fields.insert(field.to_string(), Value::Int(value));
        self
    }

    pub fn optional_bool(mut self, field: &str, value: Option<bool>) -> Self {
        self.fields
            .insert(field.to_string(), value.map_or(Value::Null, Value::Bool));
        self
    }

    pub fn string_list(mut self, field: &str, values: &[String]) -> Self {
        let items = values.iter().map(|v| Value::String(v.clone())).collect();
        self.fields.insert(field.to_string(), Value::List(items));
        self
    }

    pub fn block_list(mut self, field: &str, blocks: &[HashMap<String, Value>]) -> Self {
        let items = blocks.iter().map(|b| Value::Map(b.clone())).collect();
        self.fields.insert(field.to_string(), Value::List(items));
        self
    }

    pub fn build(self) -> Value {
        Value::Map(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(fields: &[(&str, Value)]) -> Value {
        Value::Map(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn structured_block_distinguishes_absent_null_and_empty() {
        let attributes = HashMap::from([
            ("explicit_null".to_string(), Value::Null),
            ("empty".to_string(), Value::Map(HashMap::new())),
            ("pending".to_string(), Value::Unknown),
        ]);

        assert_eq!(
            get_structured_block(&attributes, "parameters"),
            StructuredBlock::Absent
        );
        assert_eq!(
            get_structured_block(&attributes, "explicit_null"),
            StructuredBlock::Null
        );
        assert_eq!(
            get_structured_block(&attributes, "pending"),
            StructuredBlock::Unknown
        );
        assert!(matches!(
            get_structured_block(&attributes, "empty"),
            StructuredBlock::Present(Value::Map(m)) if m.is_empty()
        ));
    }

    #[test]
    fn typed_access() {
        let value = block(&[
            ("host", Value::string("db.internal")),
            ("port", Value::Int(5432)),
            ("ssl", Value::Bool(true)),
            ("catalogs", Value::List(vec![Value::string("main")])),
            ("schedule", Value::Null),
        ]);
        let config = ConfigBlock::new("postgresql", &value).unwrap();

        assert_eq!(config.required_string("host").unwrap(), "db.internal");
        assert_eq!(config.required_int("port").unwrap(), 5432);
        assert_eq!(config.optional_bool("ssl").unwrap(), Some(true));
        assert_eq!(config.string_list("catalogs").unwrap(), vec!["main"]);
        assert_eq!(config.optional_string("schedule").unwrap(), None);
        assert!(config.string_list("absent").unwrap().is_empty());
    }

    #[test]
    fn malformed_input_is_an_error_not_a_panic() {
        let value = block(&[("port", Value::string("5432")), ("host", Value::Unknown)]);
        let config = ConfigBlock::new("mysql", &value).unwrap();

        assert!(matches!(
            config.required_int("port"),
            Err(ParameterError::InvalidConfiguration { field, .. }) if field == "port"
        ));
        assert!(matches!(
            config.required_string("host"),
            Err(ParameterError::InvalidConfiguration { message, .. })
                if message == "value is not known yet"
        ));
        assert!(matches!(
            config.required_string("database"),
            Err(ParameterError::InvalidConfiguration { message, .. })
                if message == "required field is missing"
        ));
        assert!(ConfigBlock::new("mysql", &Value::string("oops")).is_err());
    }

    #[test]
    fn builder_writes_null_for_absent_optionals() {
        let value = ConfigBuilder::new()
            .string("host", "h")
            .optional_string("schedule", None)
            .build();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("schedule"), Some(&Value::Null));
        assert_eq!(map.get("host"), Some(&Value::string("h")));
    }
}
