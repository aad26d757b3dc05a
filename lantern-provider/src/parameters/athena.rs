//! Amazon Athena sources
//!
//! Athena is reached through an IAM role, so there is no credential reference.

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

pub const NAME: &str = "athena";
pub const WIRE_TAG: &str = "ATHENA";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AthenaParameters {
    pub datasource: String,
    pub database: String,
    pub region: String,
    pub role_arn: String,
    pub s3_output_location: String,
    pub workgroup: String,
    /// VPC endpoint, for accounts that block public Athena access
    pub vpc_url: Option<String>,
    pub schedule: Option<String>,
}

fn field_schema() -> ResourceSchema {
    ResourceSchema::new(NAME)
        .with_description("Amazon Athena catalog")
        .attribute(AttributeSchema::new("datasource", AttributeType::String).required())
        .attribute(AttributeSchema::new("database", AttributeType::String).required())
        .attribute(AttributeSchema::new("region", AttributeType::String).required())
        .attribute(AttributeSchema::new("role_arn", types::iam_role_arn()).required())
        .attribute(AttributeSchema::new("s3_output_location", types::s3_uri()).required())
        .attribute(AttributeSchema::new("workgroup", AttributeType::String).required())
        .attribute(AttributeSchema::new("vpc_url", AttributeType::String))
        .attribute(schedule_attribute())
}

pub fn descriptor() -> VariantDescriptor {
    VariantDescriptor {
        name: NAME,
        wire_tag: WIRE_TAG,
        field_schema: field_schema(),
        requires_secret_reference: false,
        factory: || AthenaParameters::default().into(),
    }
}

impl DecodeParameters for AthenaParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        Ok(Self {
            datasource: config.required_string("datasource")?,
            database: config.required_string("database")?,
            region: config.required_string("region")?,
            role_arn: config.required_string("role_arn")?,
            s3_output_location: config.required_string("s3_output_location")?,
            workgroup: config.required_string("workgroup")?,
            vpc_url: config.optional_string("vpc_url")?,
            schedule: config.optional_string("schedule")?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        Ok(Self {
            datasource: wire.required_string("datasource")?,
            database: wire.required_string("database")?,
            region: wire.required_string("region")?,
            role_arn: wire.required_string("role_arn")?,
            s3_output_location: wire.required_string("s3_output_location")?,
            workgroup: wire.required_string("workgroup")?,
            vpc_url: wire.optional_string("vpc_url")?,
            schedule: wire.optional_string("schedule")?,
        })
    }
}

impl VariantParameters for AthenaParameters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn wire_tag(&self) -> &'static str {
        WIRE_TAG
    }

    fn to_config(&self) -> Value {
        ConfigBuilder::new()
            .string("datasource", &self.datasource)
            .string("database", &self.database)
            .string("region", &self.region)
            .string("role_arn", &self.role_arn)
            .string("s3_output_location", &self.s3_output_location)
            .string("workgroup", &self.workgroup)
            .optional_string("vpc_url", self.vpc_url.as_deref())
            .optional_string("schedule", self.schedule.as_deref())
            .build()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        let mut body = request_body(Some(WIRE_TAG), common, Timezone::Accepted);
        body.set_field("datasource", self.datasource.as_str());
        body.set_field("database", self.database.as_str());
        body.set_field("region", self.region.as_str());
        body.set_field("role_arn", self.role_arn.as_str());
        body.set_field("s3_output_location", self.s3_output_location.as_str());
        body.set_field("workgroup", self.workgroup.as_str());
        body.set_optional_field("vpc_url", self.vpc_url.as_deref());
        body.set_optional_field("schedule", self.schedule.as_deref());
        Ok(body)
    }
}
