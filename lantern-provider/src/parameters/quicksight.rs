//! Amazon QuickSight sources

use lantern_core::resource::Value;
use lantern_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{
    CommonFields, DecodeParameters, Timezone, VariantParameters, check_discriminator, open_block,
    request_body, schedule_attribute,
};
use crate::config::ConfigBuilder;
use crate::error::ParameterResult;
use crate::registry::VariantDescriptor;
use crate::wire::WireObject;

pub const NAME: &str = "quicksight";
pub const WIRE_TAG: &str = "QUICKSIGHT";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuickSightParameters {
    pub account_id: String,
    pub aws_region: String,
    pub role_arn: String,
    pub schedule: Option<String>,
}

fn field_schema() -> ResourceSchema {
    ResourceSchema::new(NAME)
        .with_description("Amazon QuickSight account, accessed through an IAM role")
        .attribute(AttributeSchema::new("account_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("aws_region", AttributeType::String).required())
        .attribute(AttributeSchema::new("role_arn", types::iam_role_arn()).required())
        .attribute(schedule_attribute())
}

pub fn descriptor() -> VariantDescriptor {
    VariantDescriptor {
        name: NAME,
        wire_tag: WIRE_TAG,
        field_schema: field_schema(),
        requires_secret_reference: false,
        factory: || QuickSightParameters::default().into(),
    }
}

impl DecodeParameters for QuickSightParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        Ok(Self {
            account_id: config.required_string("account_id")?,
            aws_region: config.required_string("aws_region")?,
            role_arn: config.required_string("role_arn")?,
            schedule: config.optional_string("schedule")?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        Ok(Self {
            account_id: wire.required_string("account_id")?,
            aws_region: wire.required_string("aws_region")?,
            role_arn: wire.required_string("role_arn")?,
            schedule: wire.optional_string("schedule")?,
        })
    }
}

impl VariantParameters for QuickSightParameters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn wire_tag(&self) -> &'static str {
        WIRE_TAG
    }

    fn to_config(&self) -> Value {
        ConfigBuilder::new()
            .string("account_id", &self.account_id)
            .string("aws_region", &self.aws_region)
            .string("role_arn", &self.role_arn)
            .optional_string("schedule", self.schedule.as_deref())
            .build()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        let mut body = request_body(Some(WIRE_TAG), common, Timezone::Accepted);
        body.set_field("account_id", self.account_id.as_str());
        body.set_field("aws_region", self.aws_region.as_str());
        body.set_field("role_arn", self.role_arn.as_str());
        body.set_optional_field("schedule", self.schedule.as_deref());
        Ok(body)
    }
}
