//! MySQL sources

use lantern_core::resource::Value;
use lantern_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::{
    CommonFields, Connection, DecodeParameters, Timezone, VariantParameters, check_discriminator,
    open_block, request_body,
};
use crate::config::ConfigBuilder;
use crate::error::ParameterResult;
use crate::registry::VariantDescriptor;
use crate::wire::WireObject;

pub const NAME: &str = "mysql";
pub const WIRE_TAG: &str = "MYSQL";

/// TLS protocol versions the remote accepts
pub const TLS_VERSIONS: [&str; 2] = ["TLS_V_1_2", "TLS_V_1_3"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MysqlParameters {
    pub connection: Connection,
    pub mysql_tls_version: Option<String>,
}

fn field_schema() -> ResourceSchema {
    Connection::schema(NAME, "MySQL database").attribute(AttributeSchema::new(
        "mysql_tls_version",
        AttributeType::Enum(TLS_VERSIONS.iter().map(|v| v.to_string()).collect()),
    ))
}

pub fn descriptor() -> VariantDescriptor {
    VariantDescriptor {
        name: NAME,
        wire_tag: WIRE_TAG,
        field_schema: field_schema(),
        requires_secret_reference: true,
        factory: || MysqlParameters::default().into(),
    }
}

impl DecodeParameters for MysqlParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        Ok(Self {
            connection: Connection::from_config(&config)?,
            mysql_tls_version: config.optional_string("mysql_tls_version")?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        Ok(Self {
            connection: Connection::from_wire(&wire)?,
            mysql_tls_version: wire.optional_string("mysql_tls_version")?,
        })
    }
}

impl VariantParameters for MysqlParameters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn wire_tag(&self) -> &'static str {
        WIRE_TAG
    }

    fn to_config(&self) -> Value {
        self.connection
            .write_config(ConfigBuilder::new())
            .optional_string("mysql_tls_version", self.mysql_tls_version.as_deref())
            .build()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        let mut body = request_body(Some(WIRE_TAG), common, Timezone::Accepted);
        self.connection.write_wire(NAME, &mut body)?;
        body.set_optional_field("mysql_tls_version", self.mysql_tls_version.as_deref());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tls_version_is_an_enum() {
        let block = ConfigBuilder::new()
            .string("host", "db")
            .int("port", 3306)
            .string("database", "shop")
            .string("credentials", "c")
            .string("mysql_tls_version", "TLS_V_1_0")
            .build();
        assert!(MysqlParameters::decode_from_config(&block).is_err());
    }

    #[test]
    fn encodes_tls_version_under_camel_key() {
        let parameters = MysqlParameters {
            connection: Connection {
                host: "db".to_string(),
                port: 3306,
                database: "shop".to_string(),
                credentials: "c".to_string(),
                schedule: None,
            },
            mysql_tls_version: Some("TLS_V_1_2".to_string()),
        };
        let body = parameters
            .encode_create_request(&CommonFields::new("shop", None))
            .unwrap();
        assert_eq!(body.get("mysqlTlsVersion"), Some(&json!("TLS_V_1_2")));
        assert_eq!(body.get("port"), Some(&json!(3306)));
        assert!(!body.contains_key("schedule"));
    }
}
