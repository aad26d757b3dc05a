//! Microsoft Power BI sources

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

pub const NAME: &str = "powerbi";
pub const WIRE_TAG: &str = "POWER_BI";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerBiParameters {
    pub tenant_id: String,
    pub client_id: String,
    /// Workspaces to extract; empty means every workspace the client can see
    pub workspace_ids: Vec<String>,
    pub credentials: String,
    pub schedule: Option<String>,
}

fn field_schema() -> ResourceSchema {
    ResourceSchema::new(NAME)
        .with_description("Power BI tenant, accessed through a service principal")
        .attribute(AttributeSchema::new("tenant_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("client_id", AttributeType::String).required())
        .attribute(AttributeSchema::new(
            "workspace_ids",
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
        factory: || PowerBiParameters::default().into(),
    }
}

impl DecodeParameters for PowerBiParameters {
    fn decode_from_config(block: &Value) -> ParameterResult<Self> {
        let config = open_block(NAME, &field_schema(), block)?;
        Ok(Self {
            tenant_id: config.required_string("tenant_id")?,
            client_id: config.required_string("client_id")?,
            workspace_ids: config.string_list("workspace_ids")?,
            credentials: config.required_string("credentials")?,
            schedule: config.optional_string("schedule")?,
        })
    }

    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self> {
        check_discriminator(NAME, response)?;
        let wire = response.reader(NAME);
        Ok(Self {
            tenant_id: wire.required_string("tenant_id")?,
            client_id: wire.required_string("client_id")?,
            workspace_ids: wire.string_list("workspace_ids")?,
            credentials: wire.required_string("credentials")?,
            schedule: wire.optional_string("schedule")?,
        })
    }
}

impl VariantParameters for PowerBiParameters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn wire_tag(&self) -> &'static str {
        WIRE_TAG
    }

    fn to_config(&self) -> Value {
        ConfigBuilder::new()
            .string("tenant_id", &self.tenant_id)
            .string("client_id", &self.client_id)
            .string_list("workspace_ids", &self.workspace_ids)
            .string("credentials", &self.credentials)
            .optional_string("schedule", self.schedule.as_deref())
            .build()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        let mut body = request_body(Some(WIRE_TAG), common, Timezone::Accepted);
        body.set_field("tenant_id", self.tenant_id.as_str());
        body.set_field("client_id", self.client_id.as_str());
        body.set_field("workspace_ids", self.workspace_ids.clone());
        body.set_field("credentials", self.credentials.as_str());
        body.set_optional_field("schedule", self.schedule.as_deref());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_and_name_differ() {
        let parameters = PowerBiParameters::default();
        assert_eq!(parameters.name(), "powerbi");
        assert_eq!(parameters.wire_tag(), "POWER_BI");

        let response = WireObject::parse(
            r#"{"type":"POWER_BI","tenantId":"t","clientId":"c","workspaceIds":["w"],"credentials":"s"}"#,
        )
        .unwrap();
        let decoded = PowerBiParameters::decode_from_wire(&response).unwrap();
        assert_eq!(decoded.workspace_ids, vec!["w"]);
    }
}
