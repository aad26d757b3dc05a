//! Snowflake sources
//!
//! Snowflake reports timestamps in the account's timezone, so the remote
//! schema has no timezone field for this variant.

use lantern_core::resource::Value;
use lantern_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::{
    CommonFields, DecodeParameters, Timezone, VariantParameters, check_discriminator,
    credentials_attribute, open_block, request_body, schedule_attribute,
};
use crate::config::ConfigBuilder;
use crate::error::ParameterResult;
use crate::registry::VariantDescriptor;
use crate::wire::WireObject;

pub const NAME: &str = "snowflake";
pub const WIRE_TAG: &str = "SNOWFLAKE";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnowflakeParameters {
    /// Account locator, e.g. `xy12345.eu-west-1`
    pub account_identifier: String,
    pub warehouse: String,
    pub credentials: String,
    pub schedule: Option<String>,
}

fn field_schema() -> ResourceSchema {
    ResourceSchema::new(NAME)
        .with_description("Snowflake account")
        .attribute(AttributeSchema::new("account_identifier", AttributeType::String).required())
        .attribute(AttributeSchema::new("warehouse", AttributeType::String).required())
        .attribute(credentials_attribute())
        .attribute(schedule_attribute())
}

pub fn descriptor() -> VariantDescriptor {
    VariantDescriptor {
        name: NAME,
        wire_tag: WIRE_TAG,
        field_schema: field_schema(),
        requires_secret_reference: true,
        factory: || SnowflakeParameters::default().into(),
    }
}

impl DecodeParameters for SnowflakeParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        Ok(Self {
            account_identifier: config.required_string("account_identifier")?,
            warehouse: config.required_string("warehouse")?,
            credentials: config.required_string("credentials")?,
            schedule: config.optional_string("schedule")?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        Ok(Self {
            account_identifier: wire.required_string("account_identifier")?,
            warehouse: wire.required_string("warehouse")?,
            credentials: wire.required_string("credentials")?,
            schedule: wire.optional_string("schedule")?,
        })
    }
}

impl VariantParameters for SnowflakeParameters {
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
        ConfigBuilder::new()
            .string("account_identifier", &self.account_identifier)
            .string("warehouse", &self.warehouse)
            .string("credentials", &self.credentials)
            .optional_string("schedule", self.schedule.as_deref())
            .build()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        let mut body = request_body(Some(WIRE_TAG), common, Timezone::Omitted);
        body.set_field("account_identifier", self.account_identifier.as_str());
        body.set_field("warehouse", self.warehouse.as_str());
        body.set_field("credentials", self.credentials.as_str());
        body.set_optional_field("schedule", self.schedule.as_deref());
        Ok(body)
    }
}
