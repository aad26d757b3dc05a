//! Databricks SQL warehouse sources

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

pub const NAME: &str = "databricks";
pub const WIRE_TAG: &str = "DATABRICKS";
const DEFAULT_PORT: i64 = 443;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabricksParameters {
    pub host: String,
    pub http_path: String,
    pub port: i64,
    /// Unity catalogs to extract; empty means all
    pub catalogs: Vec<String>,
    pub credentials: String,
    pub schedule: Option<String>,
}

fn field_schema() -> ResourceSchema {
    ResourceSchema::new(NAME)
        .with_description("Databricks SQL warehouse")
        .attribute(AttributeSchema::new("host", AttributeType::String).required())
        .attribute(AttributeSchema::new("http_path", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("port", types::port())
                .required()
                .with_default(Value::Int(DEFAULT_PORT)),
        )
        .attribute(AttributeSchema::new(
            "catalogs",
            AttributeType::List(Box::new(AttributeType::String)),
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
        factory: || DatabricksParameters::default().into(),
    }
}

impl DatabricksParameters {
    fn encode(
        &self,
        common: &CommonFields<'_>,
        omit_empty_catalogs: bool,
    ) -> ParameterResult<WireObject> {
        let mut body = request_body(Some(WIRE_TAG), common, Timezone::Accepted);
        body.set_field("host", self.host.as_str());
        body.set_field("http_path", self.http_path.as_str());
        body.set_field("port", wire_port(NAME, self.port)?);
        if !(omit_empty_catalogs && self.catalogs.is_empty()) {
            body.set_field("catalogs", self.catalogs.clone());
        }
        body.set_field("credentials", self.credentials.as_str());
        body.set_optional_field("schedule", self.schedule.as_deref());
        Ok(body)
    }
}

impl DecodeParameters for DatabricksParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        Ok(Self {
            host: config.required_string("host")?,
            http_path: config.required_string("http_path")?,
            port: config.optional_int("port")?.unwrap_or(DEFAULT_PORT),
            catalogs: config.string_list("catalogs")?,
            credentials: config.required_string("credentials")?,
            schedule: config.optional_string("schedule")?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        Ok(Self {
            host: wire.required_string("host")?,
            http_path: wire.required_string("http_path")?,
            port: wire.required_int("port")?,
            catalogs: wire.string_list("catalogs")?,
            credentials: wire.required_string("credentials")?,
            schedule: wire.optional_string("schedule")?,
        })
    }
}

impl VariantParameters for DatabricksParameters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn wire_tag(&self) -> &'static str {
        WIRE_TAG
    }

    fn to_config(&self) -> Value {
        ConfigBuilder::new()
            .string("host", &self.host)
            .string("http_path", &self.http_path)
            .int("port", self.port)
            .string_list("catalogs", &self.catalogs)
            .string("credentials", &self.credentials)
            .optional_string("schedule", self.schedule.as_deref())
            .build()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        self.encode(common, false)
    }

    // An empty list on update would clear the catalog filter set elsewhere
    fn encode_update_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        self.encode(common, true)
    }
}
