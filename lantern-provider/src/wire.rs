//! Wire objects exchanged with the remote API
//!
//! A `WireObject` is the JSON body of a request or response. Source bodies are
//! flat: the discriminator (`type`), the common fields (`name`, `timezone`,
//! `description`) and the variant fields all live at the top level.

use std::collections::HashMap;

use lantern_core::resource::Value;
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};

use crate::case_convert::{attributes_to_config, to_wire_key};
use crate::error::{ParameterError, ParameterResult};

/// Wire key holding the variant discriminator
pub const DISCRIMINATOR_KEY: &str = "type";

/// JSON object body of an API request or response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireObject(Map<String, serde_json::Value>);

impl WireObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// New object carrying a discriminator
    pub fn tagged(tag: &str) -> Self {
        let mut object = Self::new();
        object.insert(DISCRIMINATOR_KEY, json!(tag));
        object
    }

    /// Parse a JSON object from its text form
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Wrap a JSON value, which must be an object
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn into_json(self) -> serde_json::Value {
        serde_json::Value::Object(self.0)
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Set a field by its configuration name (stored under the wire key)
    pub fn set_field(&mut self, field: &str, value: impl Into<serde_json::Value>) {
        self.insert(to_wire_key(field), value.into());
    }

    /// Set a field only when a value is present
    pub fn set_optional_field<T: Into<serde_json::Value>>(&mut self, field: &str, value: Option<T>) {
        if let Some(value) = value {
            self.set_field(field, value);
        }
    }

    /// The discriminator as sent by the remote system, in its original casing
    pub fn discriminator(&self) -> Option<&str> {
        self.get(DISCRIMINATOR_KEY).and_then(|v| v.as_str())
    }

    /// Remote identifier of the entity this object describes
    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(|v| v.as_str())
    }

    /// Typed access to the fields of one variant
    pub fn reader(&self, variant: &'static str) -> WireReader<'_> {
        WireReader {
            variant,
            object: self,
        }
    }
}

/// Extract the discriminator from a raw `get` response before decoding it
pub fn extract_discriminator(raw: &serde_json::Value) -> Option<String> {
    raw.get(DISCRIMINATOR_KEY)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Typed field access on a wire object, reporting errors against a variant
pub struct WireReader<'a> {
    variant: &'static str,
    object: &'a WireObject,
}

impl WireReader<'_> {
    fn field(&self, field: &str) -> Option<&serde_json::Value> {
        self.object
            .get(&to_wire_key(field))
            .filter(|v| !v.is_null())
    }

    fn missing(&self, field: &str) -> ParameterError {
        ParameterError::malformed_wire(self.variant, &to_wire_key(field), "field is missing")
    }

    fn mismatch(&self, field: &str, expected: &str) -> ParameterError {
        ParameterError::malformed_wire(
            self.variant,
            &to_wire_key(field),
            format!("expected {}", expected),
        )
    }

    pub fn required_string(&self, field: &str) -> ParameterResult<String> {
        self.optional_string(field)?
            .ok_or_else(|| self.missing(field))
    }

    pub fn optional_string(&self, field: &str) -> ParameterResult<Option<String>> {
        match self.field(field) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.mismatch(field, "a string")),
        }
    }

    pub fn required_int(&self, field: &str) -> ParameterResult<i64> {
        self.optional_int(field)?.ok_or_else(|| self.missing(field))
    }

    pub fn optional_int(&self, field: &str) -> ParameterResult<Option<i64>> {
        match self.field(field) {
            None => Ok(None),
            Some(v) => v
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.mismatch(field, "an integer")),
        }
    }

    pub fn optional_bool(&self, field: &str) -> ParameterResult<Option<bool>> {
        match self.field(field) {
            None => Ok(None),
            Some(v) => v
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.mismatch(field, "a boolean")),
        }
    }

    /// A list of strings; absent reads as empty
    pub fn string_list(&self, field: &str) -> ParameterResult<Vec<String>> {
        match self.field(field) {
            None => Ok(Vec::new()),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.mismatch(field, "a list of strings"))
                })
                .collect(),
            Some(_) => Err(self.mismatch(field, "a list of strings")),
        }
    }

    /// A list of nested objects, with keys converted to configuration names
    pub fn object_list(&self, field: &str) -> ParameterResult<Vec<HashMap<String, Value>>> {
        match self.field(field) {
            None => Ok(Vec::new()),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| match json_to_value(item) {
                    Some(Value::Map(map)) => Ok(attributes_to_config(&map)),
                    _ => Err(self.mismatch(field, "a list of objects")),
                })
                .collect(),
            Some(_) => Err(self.mismatch(field, "a list of objects")),
        }
    }
}

/// Convert JSON value to configuration Value
///
/// Returns `None` when a number anywhere inside is not a whole `i64`.
pub fn json_to_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Value::Int),
        serde_json::Value::Array(arr) => {
            let items: Option<Vec<Value>> = arr.iter().map(json_to_value).collect();
            items.map(Value::List)
        }
        serde_json::Value::Object(map) => {
            let m: Option<HashMap<String, Value>> = map
                .iter()
                .map(|(k, v)| json_to_value(v).map(|v| (k.clone(), v)))
                .collect();
            m.map(Value::Map)
        }
        serde_json::Value::Null => Some(Value::Null),
    }
}

/// Convert configuration Value to JSON value
///
/// Returns `None` if the value, or anything inside it, is not known yet.
pub fn value_to_json(value: &Value) -> Option<serde_json::Value> {
    match value {
        Value::String(s) => Some(json!(s)),
        Value::Bool(b) => Some(json!(b)),
        Value::Int(i) => Some(json!(i)),
        Value::Null => Some(serde_json::Value::Null),
        Value::List(items) => {
            let arr: Option<Vec<serde_json::Value>> = items.iter().map(value_to_json).collect();
            arr.map(serde_json::Value::Array)
        }
        Value::Map(map) => {
            let obj: Option<Map<String, serde_json::Value>> = map
                .iter()
                .map(|(k, v)| value_to_json(v).map(|v| (k.clone(), v)))
                .collect();
            obj.map(serde_json::Value::Object)
        }
        Value::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_object_exposes_discriminator() {
        let object = WireObject::tagged("BIGQUERY");
        assert_eq!(object.discriminator(), Some("BIGQUERY"));
        assert_eq!(
            extract_discriminator(&object.clone().into_json()),
            Some("BIGQUERY".to_string())
        );
    }

    #[test]
    fn set_field_uses_wire_key() {
        let mut object = WireObject::new();
        object.set_field("billing_project_id", "b1");
        object.set_optional_field::<String>("dataset_id", None);
        assert_eq!(object.get("billingProjectId"), Some(&json!("b1")));
        assert!(!object.contains_key("datasetId"));
    }

    #[test]
    fn parse_and_serialize() {
        let object = WireObject::parse(r#"{"type":"MYSQL","port":3306}"#).unwrap();
        assert_eq!(object.discriminator(), Some("MYSQL"));
        let text = serde_json::to_string(&object).unwrap();
        assert_eq!(WireObject::parse(&text).unwrap(), object);
        assert!(WireObject::from_json(json!([1, 2])).is_none());
    }

    #[test]
    fn reader_reports_missing_and_mismatched_fields() {
        let object = WireObject::parse(r#"{"host":"db","port":"3306"}"#).unwrap();
        let reader = object.reader("mysql");

        assert_eq!(reader.required_string("host").unwrap(), "db");
        assert!(matches!(
            reader.required_string("database"),
            Err(ParameterError::MalformedWire { field, .. }) if field == "database"
        ));
        assert!(matches!(
            reader.required_int("port"),
            Err(ParameterError::MalformedWire { message, .. }) if message == "expected an integer"
        ));
    }

    #[test]
    fn reader_null_reads_as_absent() {
        let object = WireObject::parse(r#"{"schedule":null,"catalogs":null}"#).unwrap();
        let reader = object.reader("databricks");
        assert_eq!(reader.optional_string("schedule").unwrap(), None);
        assert!(reader.string_list("catalogs").unwrap().is_empty());
    }

    #[test]
    fn json_to_value_rejects_fractional_numbers() {
        assert_eq!(json_to_value(&json!(443)), Some(Value::Int(443)));
        assert_eq!(json_to_value(&json!(443.0)), Some(Value::Int(443)));
        assert_eq!(json_to_value(&json!(1.5)), None);
        assert_eq!(json_to_value(&json!(1e300)), None);
        assert_eq!(json_to_value(&json!({"port": 5432.25})), None);
        assert_eq!(json_to_value(&json!([1, 2.5])), None);
    }

    #[test]
    fn fractional_number_in_object_list_is_malformed() {
        let response = WireObject::parse(r#"{"jobs": [{"jobId": 1.5}]}"#).unwrap();
        assert!(matches!(
            response.reader("dbtcloud").object_list("jobs"),
            Err(ParameterError::MalformedWire { .. })
        ));
    }

    #[test]
    fn value_to_json_rejects_unknown() {
        assert_eq!(value_to_json(&Value::Int(3)), Some(json!(3)));
        assert_eq!(
            value_to_json(&Value::List(vec![Value::string("a"), Value::Unknown])),
            None
        );
    }
}
