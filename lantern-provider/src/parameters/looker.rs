//! Looker sources
//!
//! Besides the instance itself, a Looker source can point at the git
//! repositories holding its LookML so that views are linked to their models.

use std::collections::HashMap;

use lantern_core::resource::Value;
use lantern_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use serde_json::json;

use super::{
    CommonFields, DecodeParameters, Timezone, VariantParameters, check_discriminator,
    credentials_attribute, open_block, request_body, schedule_attribute,
};
use crate::config::ConfigBuilder;
use crate::error::{ParameterError, ParameterResult};
use crate::registry::VariantDescriptor;
use crate::wire::WireObject;

pub const NAME: &str = "looker";
pub const WIRE_TAG: &str = "LOOKER";

/// How the remote authenticates against a LookML repository
pub const GIT_AUTH_TYPES: [&str; 2] = ["SSH_KEY", "TOKEN"];

/// A LookML repository
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GitConnection {
    pub url: String,
    pub branch: String,
    pub auth_type: String,
}

impl GitConnection {
    fn from_fields(
        fields: &HashMap<String, Value>,
        error: impl Fn(&str) -> ParameterError,
    ) -> ParameterResult<Self> {
        let get = |key: &str| match fields.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(error(key)),
        };
        Ok(Self {
            url: get("url")?,
            branch: get("branch")?,
            auth_type: get("auth_type")?,
        })
    }

    fn to_fields(&self) -> HashMap<String, Value> {
        HashMap::from([
            ("url".to_string(), Value::string(&self.url)),
            ("branch".to_string(), Value::string(&self.branch)),
            ("auth_type".to_string(), Value::string(&self.auth_type)),
        ])
    }

    fn to_wire(&self) -> serde_json::Value {
        json!({
            "url": self.url,
            "branch": self.branch,
            "authType": self.auth_type,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookerParameters {
    pub host: String,
    pub git_connections: Vec<GitConnection>,
    pub credentials: String,
    pub schedule: Option<String>,
}

fn field_schema() -> ResourceSchema {
    let git_connection = AttributeType::Object(vec![
        AttributeSchema::new("url", AttributeType::String).required(),
        AttributeSchema::new("branch", AttributeType::String).required(),
        AttributeSchema::new(
            "auth_type",
            AttributeType::Enum(GIT_AUTH_TYPES.iter().map(|t| t.to_string()).collect()),
        )
        .required(),
    ]);

    ResourceSchema::new(NAME)
        .with_description("Looker instance")
        .attribute(AttributeSchema::new("host", types::https_url()).required())
        .attribute(AttributeSchema::new(
            "git_connections",
            AttributeType::List(Box::new(git_connection)),
        ))
        .attribute(credentials_attribute())
        .attribute(schedule_attribute())
}

pub fn descriptor() -> VariantDescriptor {
    VariantDescriptor {
        name: NAME,
        wire_tag: WIRE_TAG,
        field_schema: field_schema(),
        requires_secret_reference: true,
        factory: || LookerParameters::default().into(),
    }
}

impl LookerParameters {
    fn encode(&self, common: &CommonFields<'_>, omit_empty_connections: bool) -> WireObject {
        let mut body = request_body(Some(WIRE_TAG), common, Timezone::Accepted);
        body.set_field("host", self.host.as_str());
        if !(omit_empty_connections && self.git_connections.is_empty()) {
            let connections: Vec<serde_json::Value> =
                self.git_connections.iter().map(GitConnection::to_wire).collect();
            body.set_field("git_connections", connections);
        }
        body.set_field("credentials", self.credentials.as_str());
        body.set_optional_field("schedule", self.schedule.as_deref());
        body
    }
}

impl DecodeParameters for LookerParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        let git_connections = config
            .block_list("git_connections")?
            .iter()
            .map(|fields| {
                GitConnection::from_fields(fields, |key| {
                    ParameterError::invalid_configuration(
                        NAME,
                        "git_connections",
                        format!("'{}' must be a string", key),
                    )
                })
            })
            .collect::<ParameterResult<Vec<_>>>()?;

        Ok(Self {
            host: config.required_string("host")?,
            git_connections,
            credentials: config.required_string("credentials")?,
            schedule: config.optional_string("schedule")?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        let git_connections = wire
            .object_list("git_connections")?
            .iter()
            .map(|fields| {
                GitConnection::from_fields(fields, |key| {
                    ParameterError::malformed_wire(
                        NAME,
                        "gitConnections",
                        format!("'{}' must be a string", key),
                    )
                })
            })
            .collect::<ParameterResult<Vec<_>>>()?;

        Ok(Self {
            host: wire.required_string("host")?,
            git_connections,
            credentials: wire.required_string("credentials")?,
            schedule: wire.optional_string("schedule")?,
        })
    }
}

impl VariantParameters for LookerParameters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn wire_tag(&self) -> &'static str {
        WIRE_TAG
    }

    fn to_config(&self) -> Value {
        let connections: Vec<HashMap<String, Value>> = self
            .git_connections
            .iter()
            .map(GitConnection::to_fields)
            .collect();
        ConfigBuilder::new()
            .string("host", &self.host)
            .block_list("git_connections", &connections)
            .string("credentials", &self.credentials)
            .optional_string("schedule", self.schedule.as_deref())
            .build()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        Ok(self.encode(common, false))
    }

    fn encode_update_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        Ok(self.encode(common, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_connections_are_nested_camel_case_objects() {
        let parameters = LookerParameters {
            host: "https://company.cloud.looker.com".to_string(),
            git_connections: vec![GitConnection {
                url: "git@github.com:company/looker.git".to_string(),
                branch: "main".to_string(),
                auth_type: "SSH_KEY".to_string(),
            }],
            credentials: "looker".to_string(),
            schedule: None,
        };
        let body = parameters
            .encode_create_request(&CommonFields::new("bi", None))
            .unwrap();

        assert_eq!(
            body.get("gitConnections"),
            Some(&json!([{
                "url": "git@github.com:company/looker.git",
                "branch": "main",
                "authType": "SSH_KEY",
            }]))
        );
        assert_eq!(LookerParameters::decode_from_wire(&body).unwrap(), parameters);
    }

    #[test]
    fn update_omits_empty_git_connections() {
        let parameters = LookerParameters {
            host: "https://company.cloud.looker.com".to_string(),
            credentials: "looker".to_string(),
            ..Default::default()
        };
        let common = CommonFields::new("bi", None);
        assert!(
            parameters
                .encode_create_request(&common)
                .unwrap()
                .contains_key("gitConnections")
        );
        assert!(
            !parameters
                .encode_update_request(&common)
                .unwrap()
                .contains_key("gitConnections")
        );
    }

    #[test]
    fn rejects_unknown_auth_type() {
        let block = ConfigBuilder::new()
            .string("host", "https://company.cloud.looker.com")
            .block_list(
                "git_connections",
                &[HashMap::from([
                    ("url".to_string(), Value::string("u")),
                    ("branch".to_string(), Value::string("main")),
                    ("auth_type".to_string(), Value::string("PASSWORD")),
                ])],
            )
            .string("credentials", "looker")
            .build();
        assert!(LookerParameters::decode_from_config(&block).is_err());
    }
}
