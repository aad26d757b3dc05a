//! Google BigQuery sources

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

pub const NAME: &str = "bigquery";
pub const WIRE_TAG: &str = "BIGQUERY";

/// Connection to a BigQuery project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BigQueryParameters {
    pub project_id: String,
    /// Project billed for metadata queries, when it differs from `project_id`
    pub billing_project_id: Option<String>,
    /// Restrict extraction to one dataset
    pub dataset_id: Option<String>,
    pub credentials: String,
    pub schedule: Option<String>,
}

fn field_schema() -> ResourceSchema {
    ResourceSchema::new(NAME)
        .with_description("Google BigQuery project")
        .attribute(AttributeSchema::new("project_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("billing_project_id", AttributeType::String))
        .attribute(AttributeSchema::new("dataset_id", AttributeType::String))
        .attribute(credentials_attribute())
        .attribute(schedule_attribute())
}

pub fn descriptor() -> VariantDescriptor {
    VariantDescriptor {
        name: NAME,
        wire_tag: WIRE_TAG,
        field_schema: field_schema(),
        requires_secret_reference: true,
        factory: || BigQueryParameters::default().into(),
    }
}

impl DecodeParameters for BigQueryParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        Ok(Self {
            project_id: config.required_string("project_id")?,
            billing_project_id: config.optional_string("billing_project_id")?,
            dataset_id: config.optional_string("dataset_id")?,
            credentials: config.required_string("credentials")?,
            schedule: config.optional_string("schedule")?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        Ok(Self {
            project_id: wire.required_string("project_id")?,
            billing_project_id: wire.optional_string("billing_project_id")?,
            dataset_id: wire.optional_string("dataset_id")?,
            credentials: wire.required_string("credentials")?,
            schedule: wire.optional_string("schedule")?,
        })
    }
}

impl VariantParameters for BigQueryParameters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn wire_tag(&self) -> &'static str {
        WIRE_TAG
    }

    fn to_config(&self) -> Value {
        ConfigBuilder::new()
            .string("project_id", &self.project_id)
            .optional_string("billing_project_id", self.billing_project_id.as_deref())
            .optional_string("dataset_id", self.dataset_id.as_deref())
            .string("credentials", &self.credentials)
            .optional_string("schedule", self.schedule.as_deref())
            .build()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        let mut body = request_body(Some(WIRE_TAG), common, Timezone::Accepted);
        body.set_field("project_id", self.project_id.as_str());
        body.set_optional_field("billing_project_id", self.billing_project_id.as_deref());
        body.set_optional_field("dataset_id", self.dataset_id.as_deref());
        body.set_field("credentials", self.credentials.as_str());
        body.set_optional_field("schedule", self.schedule.as_deref());
        Ok(body)
    }
}
