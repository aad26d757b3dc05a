//! Apache Airflow sources

use lantern_core::resource::Value;
use lantern_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{
    CommonFields, DecodeParameters, Timezone, VariantParameters, check_discriminator,
    credentials_attribute, open_block, request_body, schedule_attribute, wire_port,
};
use crate::config::ConfigBuilder;
use crate::error::ParameterResult;
use crate::registry::VariantDescriptor;
use crate::wire::WireObject;

pub const NAME: &str = "airflow";
pub const WIRE_TAG: &str = "AIRFLOW";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AirflowParameters {
    pub host: String,
    pub port: i64,
    pub credentials: String,
    pub schedule: Option<String>,
}

fn field_schema() -> ResourceSchema {
    ResourceSchema::new(NAME)
        .with_description("Apache Airflow webserver")
        .attribute(AttributeSchema::new("host", AttributeType::String).required())
        .attribute(AttributeSchema::new("port", types::port()).required())
        .attribute(credentials_attribute())
        .attribute(schedule_attribute())
}

pub fn descriptor() -> VariantDescriptor {
    VariantDescriptor {
        name: NAME,
        wire_tag: WIRE_TAG,
        field_schema: field_schema(),
        requires_secret_reference: true,
        factory: || AirflowParameters::default().into(),
    }
}

impl DecodeParameters for AirflowParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        Ok(Self {
            host: config.required_string("host")?,
            port: config.required_int("port")?,
            credentials: config.required_string("credentials")?,
            schedule: config.optional_string("schedule")?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        Ok(Self {
            host: wire.required_string("host")?,
            port: wire.required_int("port")?,
            credentials: wire.required_string("credentials")?,
            schedule: wire.optional_string("schedule")?,
        })
    }
}

impl VariantParameters for AirflowParameters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn wire_tag(&self) -> &'static str {
        WIRE_TAG
    }

    fn to_config(&self) -> Value {
        ConfigBuilder::new()
            .string("host", &self.host)
            .int("port", self.port)
            .string("credentials", &self.credentials)
            .optional_string("schedule", self.schedule.as_deref())
            .build()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        let mut body = request_body(Some(WIRE_TAG), common, Timezone::Accepted);
        body.set_field("host", self.host.as_str());
        body.set_field("port", wire_port(NAME, self.port)?);
        body.set_field("credentials", self.credentials.as_str());
        body.set_optional_field("schedule", self.schedule.as_deref());
        Ok(body)
    }
}
