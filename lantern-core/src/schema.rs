//! Schema - attribute types and validation
//!
//! Schemas are checked before any remote call, so a configuration error is
//! reported against the attribute path the user wrote.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

#[derive(Debug, Clone)]
pub enum AttributeType {
    String,
    Int,
    Bool,
    /// One of a fixed set of strings
    Enum(Vec<String>),
    /// A base type narrowed by a validation function
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
    /// Nested block with its own attributes
    Object(Vec<AttributeSchema>),
}

impl AttributeType {
    /// Check a value against this type
    ///
    /// `Unknown` always passes; it is checked again once known.
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (_, Value::Unknown)
            | (AttributeType::String, Value::String(_))
            | (AttributeType::Int, Value::Int(_))
            | (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(allowed), Value::String(s)) => {
                if allowed.contains(s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: allowed.clone(),
                    })
                }
            }

            (AttributeType::Custom { base, validate, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|message| TypeError::ValidationFailed { message })
            }

            (AttributeType::List(item_type), Value::List(items)) => items
                .iter()
                .enumerate()
                .try_for_each(|(i, item)| {
                    item_type
                        .validate(item)
                        .map_err(|e| e.within(&format!("[{}]", i)))
                }),

            (AttributeType::Map(value_type), Value::Map(entries)) => {
                entries.iter().try_for_each(|(key, v)| {
                    value_type.validate(v).map_err(|e| e.within(key))
                })
            }

            (AttributeType::Object(fields), Value::Map(values)) => {
                match check_fields(fields.iter(), values).into_iter().next() {
                    Some(error) => Err(error),
                    None => Ok(()),
                }
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.to_string(),
                got: value_kind(value).to_string(),
            }),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::String => f.write_str("String"),
            AttributeType::Int => f.write_str("Int"),
            AttributeType::Bool => f.write_str("Bool"),
            AttributeType::Enum(allowed) => write!(f, "Enum({})", allowed.join(" | ")),
            AttributeType::Custom { name, .. } => f.write_str(name),
            AttributeType::List(item) => write!(f, "List<{}>", item),
            AttributeType::Map(value) => write!(f, "Map<{}>", value),
            AttributeType::Object(_) => f.write_str("Object"),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "String",
        Value::Int(_) => "Int",
        Value::Bool(_) => "Bool",
        Value::List(_) => "List",
        Value::Map(_) => "Map",
        Value::Null => "Null",
        Value::Unknown => "Unknown",
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    /// An error inside a nested attribute, list item or map entry
    #[error("{path}: {inner}")]
    Nested { path: String, inner: Box<TypeError> },
}

impl TypeError {
    fn within(self, segment: &str) -> Self {
        match self {
            TypeError::Nested { path, inner } => TypeError::Nested {
                path: join_path(segment, &path),
                inner,
            },
            leaf => TypeError::Nested {
                path: segment.to_string(),
                inner: Box::new(leaf),
            },
        }
    }

    /// Path of the offending field, e.g. `bigquery.project_id` or `scopes[1]`
    pub fn path(&self) -> Option<String> {
        let (prefix, leaf) = match self {
            TypeError::Nested { path, inner } => (Some(path.as_str()), inner.as_ref()),
            leaf => (None, leaf),
        };
        let field = match leaf {
            TypeError::MissingRequired { name } | TypeError::UnknownAttribute { name } => {
                Some(name.as_str())
            }
            _ => None,
        };
        match (prefix, field) {
            (Some(prefix), Some(field)) => Some(join_path(prefix, field)),
            (Some(prefix), None) => Some(prefix.to_string()),
            (None, field) => field.map(str::to_string),
        }
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('[') {
        format!("{}{}", parent, child)
    } else {
        format!("{}.{}", parent, child)
    }
}

/// Check `values` against `fields`: required fields first, then types, then unknown keys
///
/// `Null` counts as absent. Keys starting with `_` are internal and skipped.
fn check_fields<'a>(
    fields: impl Iterator<Item = &'a AttributeSchema>,
    values: &HashMap<String, Value>,
) -> Vec<TypeError> {
    let mut errors = Vec::new();
    let mut known = Vec::new();

    for field in fields {
        known.push(field.name.as_str());
        match values.get(&field.name) {
            None | Some(Value::Null) => {
                if field.required && field.default.is_none() {
                    errors.push(TypeError::MissingRequired {
                        name: field.name.clone(),
                    });
                }
            }
            Some(value) => {
                if let Err(e) = field.attr_type.validate(value) {
                    errors.push(e.within(&field.name));
                }
            }
        }
    }

    let mut unknown: Vec<&String> = values
        .keys()
        .filter(|key| !key.starts_with('_') && !known.contains(&key.as_str()))
        .collect();
    unknown.sort();
    errors.extend(
        unknown
            .into_iter()
            .map(|name| TypeError::UnknownAttribute { name: name.clone() }),
    );
    errors
}

#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the provider rather than by the user
    pub computed: bool,
    /// A change to this attribute cannot be applied in place
    pub requires_replace: bool,
    /// Value must not be echoed in plan output
    pub sensitive: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        AttributeSchema {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            requires_replace: false,
            sensitive: false,
            default: None,
            description: None,
        }
    }

    pub fn required(self) -> Self {
        AttributeSchema {
            required: true,
            ..self
        }
    }

    pub fn computed(self) -> Self {
        AttributeSchema {
            computed: true,
            ..self
        }
    }

    pub fn requires_replace(self) -> Self {
        AttributeSchema {
            requires_replace: true,
            ..self
        }
    }

    pub fn sensitive(self) -> Self {
        AttributeSchema {
            sensitive: true,
            ..self
        }
    }

    pub fn with_default(self, value: Value) -> Self {
        AttributeSchema {
            default: Some(value),
            ..self
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        AttributeSchema {
            description: Some(description.into()),
            ..self
        }
    }
}

/// Attributes of one resource type, or of one variant's parameter block
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        ResourceSchema {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn sorted(&self) -> Vec<&AttributeSchema> {
        let mut attributes: Vec<&AttributeSchema> = self.attributes.values().collect();
        attributes.sort_by(|a, b| a.name.cmp(&b.name));
        attributes
    }

    pub fn required_attributes(&self) -> Vec<&str> {
        self.sorted()
            .into_iter()
            .filter(|a| a.required)
            .map(|a| a.name.as_str())
            .collect()
    }

    /// Attributes whose change forces destroy and recreate
    pub fn requires_replace_attributes(&self) -> impl Iterator<Item = &AttributeSchema> {
        self.attributes.values().filter(|a| a.requires_replace)
    }

    /// This schema as the type of a nested block
    pub fn as_object_type(&self) -> AttributeType {
        AttributeType::Object(self.sorted().into_iter().cloned().collect())
    }

    /// Every problem with `attributes`, in a stable order
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let errors = check_fields(self.sorted().into_iter(), attributes);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Custom attribute types shared by the source variants
pub mod types {
    use super::*;

    /// TCP port, 1-65535
    pub fn port() -> AttributeType {
        AttributeType::Custom {
            name: "Port".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if !(1..=65535).contains(n) => {
                    Err(format!("Port {} is out of range 1-65535", n))
                }
                _ => Ok(()),
            },
        }
    }

    pub fn iam_role_arn() -> AttributeType {
        AttributeType::Custom {
            name: "IamRoleArn".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => validate_iam_role_arn(s),
                _ => Ok(()),
            },
        }
    }

    pub fn s3_uri() -> AttributeType {
        AttributeType::Custom {
            name: "S3Uri".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => validate_s3_uri(s),
                _ => Ok(()),
            },
        }
    }

    pub fn https_url() -> AttributeType {
        AttributeType::Custom {
            name: "HttpsUrl".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => match s.strip_prefix("https://") {
                    Some(host) if !host.is_empty() => Ok(()),
                    _ => Err(format!("Invalid URL '{}': expected https://<host>", s)),
                },
                _ => Ok(()),
            },
        }
    }
}

/// `arn:<partition>:iam::<12-digit account>:role/<name>`
pub fn validate_iam_role_arn(arn: &str) -> Result<(), String> {
    let invalid = || {
        format!(
            "Invalid role ARN '{}': expected arn:aws:iam::<account>:role/<name>",
            arn
        )
    };
    let parts: Vec<&str> = arn.splitn(6, ':').collect();
    let [prefix, _partition, service, _region, account, resource] = parts[..] else {
        return Err(invalid());
    };
    if prefix != "arn" || service != "iam" {
        return Err(invalid());
    }
    if account.len() != 12 || !account.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!(
            "Invalid account '{}' in role ARN: must be 12 digits",
            account
        ));
    }
    match resource.strip_prefix("role/") {
        Some(name) if !name.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

/// `s3://<bucket>[/<prefix>]` with a bucket name of 3 to 63 characters
pub fn validate_s3_uri(uri: &str) -> Result<(), String> {
    let Some(rest) = uri.strip_prefix("s3://") else {
        return Err(format!("Invalid S3 location '{}': expected s3://<bucket>", uri));
    };
    let bucket = rest.split('/').next().unwrap_or_default();
    if !(3..=63).contains(&bucket.len()) {
        return Err(format!(
            "Invalid bucket '{}' in S3 location: must be between 3 and 63 characters",
            bucket
        ));
    }
    Ok(())
}
