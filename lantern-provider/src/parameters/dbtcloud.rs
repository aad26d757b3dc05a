//! dbt Cloud sources

use lantern_core::resource::Value;
use lantern_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{
    CommonFields, DecodeParameters, Timezone, VariantParameters, check_discriminator,
    credentials_attribute, open_block, request_body, schedule_attribute,
};
use crate::config::ConfigBuilder;
use crate::error::ParameterResult;
use crate::registry::VariantDescriptor;
use crate::wire::WireObject;

pub const NAME: &str = "dbtcloud";
pub const WIRE_TAG: &str = "DBT_CLOUD";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbtCloudParameters {
    pub account_id: String,
    pub base_url: String,
    pub credentials: String,
    pub schedule: Option<String>,
}

fn field_schema() -> ResourceSchema {
    ResourceSchema::new(NAME)
        .with_description("dbt Cloud account")
        .attribute(AttributeSchema::new("account_id", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("base_url", types::https_url())
                .required()
                .with_description("Access URL of the dbt Cloud region"),
        )
        .attribute(credentials_attribute())
        .attribute(schedule_attribute())
}

pub fn descriptor() -> VariantDescriptor {
    VariantDescriptor {
        name: NAME,
        wire_tag: WIRE_TAG,
        field_schema: field_schema(),
        requires_secret_reference: true,
        factory: || DbtCloudParameters::default().into(),
    }
}

impl DbtCloudParameters {
    fn encode(&self, tag: Option<&str>, common: &CommonFields<'_>) -> WireObject {
        let mut body = request_body(tag, common, Timezone::Accepted);
        body.set_field("account_id", self.account_id.as_str());
        body.set_field("base_url", self.base_url.as_str());
        body.set_field("credentials", self.credentials.as_str());
        body.set_optional_field("schedule", self.schedule.as_deref());
        body
    }
}

impl DecodeParameters for DbtCloudParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        Ok(Self {
            account_id: config.required_string("account_id")?,
            base_url: config.required_string("base_url")?,
            credentials: config.required_string("credentials")?,
            schedule: config.optional_string("schedule")?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        Ok(Self {
            account_id: wire.required_string("account_id")?,
            base_url: wire.required_string("base_url")?,
            credentials: wire.required_string("credentials")?,
            schedule: wire.optional_string("schedule")?,
        })
    }
}

impl VariantParameters for DbtCloudParameters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn wire_tag(&self) -> &'static str {
        WIRE_TAG
    }

    fn to_config(&self) -> Value {
        ConfigBuilder::new()
            .string("account_id", &self.account_id)
            .string("base_url", &self.base_url)
            .string("credentials", &self.credentials)
            .optional_string("schedule", self.schedule.as_deref())
            .build()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        Ok(self.encode(Some(WIRE_TAG), common))
    }

    fn encode_update_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        Ok(self.encode(None, common))
    }
}
