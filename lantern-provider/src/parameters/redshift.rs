//! Amazon Redshift sources

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

pub const NAME: &str = "redshift";
pub const WIRE_TAG: &str = "REDSHIFT";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedshiftParameters {
    pub connection: Connection,
    pub ssl: Option<bool>,
}

fn field_schema() -> ResourceSchema {
    Connection::schema(NAME, "Amazon Redshift cluster")
        .attribute(AttributeSchema::new("ssl", AttributeType::Bool))
}

pub fn descriptor() -> VariantDescriptor {
    VariantDescriptor {
        name: NAME,
        wire_tag: WIRE_TAG,
        field_schema: field_schema(),
        requires_secret_reference: true,
        factory: || RedshiftParameters::default().into(),
    }
}

impl DecodeParameters for RedshiftParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        Ok(Self {
            connection: Connection::from_config(&config)?,
            ssl: config.optional_bool("ssl")?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        Ok(Self {
            connection: Connection::from_wire(&wire)?,
            ssl: wire.optional_bool("ssl")?,
        })
    }
}

impl VariantParameters for RedshiftParameters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn wire_tag(&self) -> &'static str {
        WIRE_TAG
    }

    fn to_config(&self) -> Value {
        self.connection
            .write_config(ConfigBuilder::new())
            .optional_bool("ssl", self.ssl)
            .build()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        let mut body = request_body(Some(WIRE_TAG), common, Timezone::Accepted);
        self.connection.write_wire(NAME, &mut body)?;
        body.set_optional_field("ssl", self.ssl);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ssl_flag_round_trips_as_boolean() {
        let response = WireObject::parse(
            r#"{"type":"REDSHIFT","host":"cluster.redshift.amazonaws.com","port":5439,
                "database":"dev","credentials":"rs","ssl":false}"#,
        )
        .unwrap();
        let parameters = RedshiftParameters::decode_from_wire(&response).unwrap();
        assert_eq!(parameters.ssl, Some(false));
        assert_eq!(parameters.connection.port, 5439);

        let body = parameters
            .encode_create_request(&CommonFields::new("warehouse", None))
            .unwrap();
        assert_eq!(body.get("ssl"), Some(&json!(false)));
    }
}
