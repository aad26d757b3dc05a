//! Oracle Database sources
//!
//! The remote schema for Oracle has no timezone; sessions use the database
//! timezone.

use lantern_core::resource::Value;
use lantern_core::schema::ResourceSchema;

use super::{
    CommonFields, Connection, DecodeParameters, Timezone, VariantParameters, check_discriminator,
    open_block, request_body,
};
use crate::config::ConfigBuilder;
use crate::error::ParameterResult;
use crate::registry::VariantDescriptor;
use crate::wire::WireObject;

pub const NAME: &str = "oracle";
pub const WIRE_TAG: &str = "ORACLE";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleParameters {
    pub connection: Connection,
}

fn field_schema() -> ResourceSchema {
    Connection::schema(NAME, "Oracle database")
}

pub fn descriptor() -> VariantDescriptor {
    VariantDescriptor {
        name: NAME,
        wire_tag: WIRE_TAG,
        field_schema: field_schema(),
        requires_secret_reference: true,
        factory: || OracleParameters::default().into(),
    }
}

impl DecodeParameters for OracleParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        Ok(Self {
            connection: Connection::from_config(&config)?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        Ok(Self {
            connection: Connection::from_wire(&wire)?,
        })
    }
}

impl VariantParameters for OracleParameters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn wire_tag(&self) -> &'static str {
        WIRE_TAG
    }

    fn accepts_timezone(&self) -> bool {
        false
    }

    fn to_config(&self) -> Value {
        self.connection.write_config(ConfigBuilder::new()).build()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        let mut body = request_body(Some(WIRE_TAG), common, Timezone::Omitted);
        self.connection.write_wire(NAME, &mut body)?;
        Ok(body)
    }
}
