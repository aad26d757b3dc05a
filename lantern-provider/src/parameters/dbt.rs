//! dbt Core sources
//!
//! Metadata is pushed from dbt runs, so the remote schema has neither a
//! credential nor a timezone, and update bodies carry no discriminator.

use lantern_core::resource::Value;
use lantern_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::{
    CommonFields, DecodeParameters, Timezone, VariantParameters, check_discriminator, open_block,
    request_body, schedule_attribute,
};
use crate::config::ConfigBuilder;
use crate::error::ParameterResult;
use crate::registry::VariantDescriptor;
use crate::wire::WireObject;

pub const NAME: &str = "dbt";
pub const WIRE_TAG: &str = "DBT";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbtParameters {
    pub project_name: String,
    pub target: String,
    pub schedule: Option<String>,
}

fn field_schema() -> ResourceSchema {
    ResourceSchema::new(NAME)
        .with_description("dbt Core project")
        .attribute(AttributeSchema::new("project_name", AttributeType::String).required())
        .attribute(AttributeSchema::new("target", AttributeType::String).required())
        .attribute(schedule_attribute())
}

pub fn descriptor() -> VariantDescriptor {
    VariantDescriptor {
        name: NAME,
        wire_tag: WIRE_TAG,
        field_schema: field_schema(),
        requires_secret_reference: false,
        factory: || DbtParameters::default().into(),
    }
}

impl DbtParameters {
    fn encode(&self, tag: Option<&str>, common: &CommonFields<'_>) -> WireObject {
        let mut body = request_body(tag, common, Timezone::Omitted);
        body.set_field("project_name", self.project_name.as_str());
        body.set_field("target", self.target.as_str());
        body.set_optional_field("schedule", self.schedule.as_deref());
        body
    }
}

impl DecodeParameters for DbtParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        Ok(Self {
            project_name: config.required_string("project_name")?,
            target: config.required_string("target")?,
            schedule: config.optional_string("schedule")?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        Ok(Self {
            project_name: wire.required_string("project_name")?,
            target: wire.required_string("target")?,
            schedule: wire.optional_string("schedule")?,
        })
    }
}

impl VariantParameters for DbtParameters {
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
            .string("project_name", &self.project_name)
            .string("target", &self.target)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_has_no_discriminator_and_no_timezone() {
        let parameters = DbtParameters {
            project_name: "jaffle_shop".to_string(),
            target: "prod".to_string(),
            schedule: None,
        };
        let common = CommonFields::new("dbt", Some("Europe/Paris"));

        let create = parameters.encode_create_request(&common).unwrap();
        assert_eq!(create.discriminator(), Some("DBT"));
        assert!(!create.contains_key("timezone"));

        let update = parameters.encode_update_request(&common).unwrap();
        assert_eq!(update.discriminator(), None);
        assert!(!update.contains_key("timezone"));
        assert!(update.contains_key("projectName"));
    }
}
