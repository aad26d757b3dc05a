//! Fields shared by sources reached over a host/port/database connection

use lantern_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{credentials_attribute, schedule_attribute, wire_port};
use crate::config::{ConfigBlock, ConfigBuilder};
use crate::error::ParameterResult;
use crate::wire::{WireObject, WireReader};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Connection {
    pub host: String,
    pub port: i64,
    pub database: String,
    pub credentials: String,
    pub schedule: Option<String>,
}

impl Connection {
    /// Field schema of a connection source, extended by the variant
    pub(crate) fn schema(variant: &str, description: &str) -> ResourceSchema {
        ResourceSchema::new(variant)
            .with_description(description)
            .attribute(AttributeSchema::new("host", AttributeType::String).required())
            .attribute(AttributeSchema::new("port", types::port()).required())
            .attribute(AttributeSchema::new("database", AttributeType::String).required())
            .attribute(credentials_attribute())
            .attribute(schedule_attribute())
    }

    pub(crate) fn from_config(config: &ConfigBlock<'_>) -> ParameterResult<Self> {
        Ok(Self {
            host: config.required_string("host")?,
            port: config.required_int("port")?,
            database: config.required_string("database")?,
            credentials: config.required_string("credentials")?,
            schedule: config.optional_string("schedule")?,
        })
    }

    pub(crate) fn from_wire(wire: &WireReader<'_>) -> ParameterResult<Self> {
        Ok(Self {
            host: wire.required_string("host")?,
            port: wire.required_int("port")?,
            database: wire.required_string("database")?,
            credentials: wire.required_string("credentials")?,
            schedule: wire.optional_string("schedule")?,
        })
    }

    pub(crate) fn write_config(&self, builder: ConfigBuilder) -> ConfigBuilder {
        builder
            .string("host", &self.host)
            .int("port", self.port)
            .string("database", &self.database)
            .string("credentials", &self.credentials)
            .optional_string("schedule", self.schedule.as_deref())
    }

    pub(crate) fn write_wire(&self, variant: &str, body: &mut WireObject) -> ParameterResult<()> {
        body.set_field("host", self.host.as_str());
        body.set_field("port", wire_port(variant, self.port)?);
        body.set_field("database", self.database.as_str());
        body.set_field("credentials", self.credentials.as_str());
        body.set_optional_field("schedule", self.schedule.as_deref());
        Ok(())
    }
}
