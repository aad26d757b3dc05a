//! Source parameters - one typed parameter set per kind of source
//!
//! Every variant implements `VariantParameters` (naming, wire encoding,
//! configuration form) and `DecodeParameters` (construction from a
//! configuration block or a wire response). `ResolvedParameters` is the closed
//! sum of all variants and is what the rest of the provider passes around.

pub mod airflow;
pub mod athena;
pub mod bigquery;
mod connection;
pub mod databricks;
pub mod dbt;
pub mod dbtcloud;
pub mod fivetran;
pub mod looker;
pub mod mssql;
pub mod mysql;
pub mod oracle;
pub mod postgresql;
pub mod powerbi;
pub mod quicksight;
pub mod redshift;
pub mod snowflake;
pub mod synapse;
pub mod tableau;

use std::fmt;
use std::sync::OnceLock;

use lantern_core::resource::Value;
use lantern_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use regex::Regex;
use serde_json::json;

use crate::case_convert::canonical_variant_name;
use crate::config::ConfigBlock;
use crate::error::{ParameterError, ParameterResult};
use crate::wire::WireObject;

pub use airflow::AirflowParameters;
pub use athena::AthenaParameters;
pub use bigquery::BigQueryParameters;
pub use connection::Connection;
pub use databricks::DatabricksParameters;
pub use dbt::DbtParameters;
pub use dbtcloud::DbtCloudParameters;
pub use fivetran::FivetranParameters;
pub use looker::LookerParameters;
pub use mssql::MssqlParameters;
pub use mysql::MysqlParameters;
pub use oracle::OracleParameters;
pub use postgresql::PostgresqlParameters;
pub use powerbi::PowerBiParameters;
pub use quicksight::QuickSightParameters;
pub use redshift::RedshiftParameters;
pub use snowflake::SnowflakeParameters;
pub use synapse::SynapseParameters;
pub use tableau::TableauParameters;

/// Fields every source carries regardless of its variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommonFields<'a> {
    pub name: &'a str,
    pub timezone: Option<&'a str>,
}

impl<'a> CommonFields<'a> {
    pub fn new(name: &'a str, timezone: Option<&'a str>) -> Self {
        Self { name, timezone }
    }
}

/// Capabilities shared by every variant
pub trait VariantParameters: fmt::Debug + Send + Sync {
    /// Canonical lowercase identifier, also the configuration slot key
    fn name(&self) -> &'static str;

    /// Discriminator used by the remote API
    fn wire_tag(&self) -> &'static str;

    /// Configuration block equivalent to these parameters
    fn to_config(&self) -> Value;

    /// Whether the remote schema for this variant has a timezone
    fn accepts_timezone(&self) -> bool {
        true
    }

    /// Body of a create call
    ///
    /// Fields the remote schema does not define for this variant are omitted,
    /// never sent as null.
    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject>;

    /// Body of an update call; the same as create unless the variant says otherwise
    fn encode_update_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        self.encode_create_request(common)
    }
}

/// Construction of a variant from its two external representations
pub trait DecodeParameters: Sized {
    /// Parse the variant's configuration block
    fn decode_from_config(block: &Value) -> ParameterResult<Self>;

    /// Parse a wire response whose discriminator designates this variant
    fn decode_from_wire(response: &WireObject) -> ParameterResult<Self>;
}

macro_rules! resolved_parameters {
    ($($arm:ident($ty:ty)),+ $(,)?) => {
        /// The parameters of exactly one variant
        #[derive(Debug, Clone, PartialEq)]
        pub enum ResolvedParameters {
            $($arm($ty),)+
        }

        impl ResolvedParameters {
            /// An empty instance of every variant, in declaration order
            pub fn all_empty() -> Vec<ResolvedParameters> {
                vec![$(ResolvedParameters::$arm(<$ty>::default()),)+]
            }

            fn as_variant(&self) -> &dyn VariantParameters {
                match self {
                    $(ResolvedParameters::$arm(p) => p,)+
                }
            }

            /// Decode a configuration block as the same variant as `self`
            pub fn decode_from_config(&self, block: &Value) -> ParameterResult<Self> {
                match self {
                    $(ResolvedParameters::$arm(_) => {
                        <$ty>::decode_from_config(block).map(ResolvedParameters::$arm)
                    })+
                }
            }

            /// Decode a wire response as the same variant as `self`
            pub fn decode_from_wire(&self, response: &WireObject) -> ParameterResult<Self> {
                match self {
                    $(ResolvedParameters::$arm(_) => {
                        <$ty>::decode_from_wire(response).map(ResolvedParameters::$arm)
                    })+
                }
            }
        }

        $(
            impl From<$ty> for ResolvedParameters {
                fn from(parameters: $ty) -> Self {
                    ResolvedParameters::$arm(parameters)
                }
            }
        )+
    };
}

resolved_parameters! {
    Airflow(AirflowParameters),
    Athena(AthenaParameters),
    BigQuery(BigQueryParameters),
    Databricks(DatabricksParameters),
    Dbt(DbtParameters),
    DbtCloud(DbtCloudParameters),
    Fivetran(FivetranParameters),
    Looker(LookerParameters),
    Mssql(MssqlParameters),
    Mysql(MysqlParameters),
    Oracle(OracleParameters),
    Postgresql(PostgresqlParameters),
    PowerBi(PowerBiParameters),
    QuickSight(QuickSightParameters),
    Redshift(RedshiftParameters),
    Snowflake(SnowflakeParameters),
    Synapse(SynapseParameters),
    Tableau(TableauParameters),
}

impl VariantParameters for ResolvedParameters {
    fn name(&self) -> &'static str {
        self.as_variant().name()
    }

    fn wire_tag(&self) -> &'static str {
        self.as_variant().wire_tag()
    }

    fn to_config(&self) -> Value {
        self.as_variant().to_config()
    }

    fn accepts_timezone(&self) -> bool {
        self.as_variant().accepts_timezone()
    }

    fn encode_create_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        let body = self.as_variant().encode_create_request(common)?;
        log::debug!("encoded {} create request", self.name());
        Ok(body)
    }

    fn encode_update_request(&self, common: &CommonFields<'_>) -> ParameterResult<WireObject> {
        let body = self.as_variant().encode_update_request(common)?;
        log::debug!("encoded {} update request", self.name());
        Ok(body)
    }
}

/// Whether a variant's remote schema defines a timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Timezone {
    Accepted,
    Omitted,
}

/// Start a request body with the discriminator (if any) and the common fields
pub(crate) fn request_body(
    tag: Option<&str>,
    common: &CommonFields<'_>,
    timezone: Timezone,
) -> WireObject {
    let mut body = match tag {
        Some(tag) => WireObject::tagged(tag),
        None => WireObject::new(),
    };
    body.insert("name", json!(common.name));
    if timezone == Timezone::Accepted
        && let Some(tz) = common.timezone
    {
        body.insert("timezone", json!(tz));
    }
    body
}

/// Check that a response designates the variant about to decode it
pub(crate) fn check_discriminator(
    expected: &'static str,
    response: &WireObject,
) -> ParameterResult<()> {
    let found = response.discriminator().ok_or_else(|| {
        ParameterError::malformed_wire(expected, crate::wire::DISCRIMINATOR_KEY, "field is missing")
    })?;

    if canonical_variant_name(found) == expected {
        Ok(())
    } else {
        log::error!(
            "decoder dispatch bug: '{}' decoder received a '{}' wire object",
            expected,
            found
        );
        Err(ParameterError::UnexpectedVariant {
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}

/// Open a configuration block after checking it against the variant's field schema
pub(crate) fn open_block<'a>(
    variant: &'static str,
    schema: &ResourceSchema,
    block: &'a Value,
) -> ParameterResult<ConfigBlock<'a>> {
    let config = ConfigBlock::new(variant, block)?;
    if let Some(fields) = block.as_map()
        && let Err(errors) = schema.validate(fields)
        && let Some(error) = errors.into_iter().next()
    {
        let field = error.path().unwrap_or_else(|| variant.to_string());
        return Err(ParameterError::invalid_configuration(
            variant,
            &field,
            error.to_string(),
        ));
    }
    Ok(config)
}

/// Reference to a credential holding the source's secret
pub(crate) fn credentials_attribute() -> AttributeSchema {
    AttributeSchema::new("credentials", AttributeType::String)
        .required()
        .with_description("Name of the credential holding the connection secret")
}

fn cron_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^(@(yearly|annually|monthly|weekly|daily|hourly)|(\S+\s+){4}\S+)$").ok()
        })
        .as_ref()
}

/// Validate a cron expression (five fields, or one of the `@` shorthands)
pub fn validate_cron_schedule(schedule: &str) -> Result<(), String> {
    match cron_pattern() {
        Some(pattern) if pattern.is_match(schedule.trim()) => Ok(()),
        Some(_) => Err(format!(
            "Invalid schedule '{}': expected a cron expression such as '0 2 * * *' or '@daily'",
            schedule
        )),
        None => Ok(()),
    }
}

/// Cron expression controlling metadata refreshes
pub(crate) fn schedule_attribute() -> AttributeSchema {
    let cron = AttributeType::Custom {
        name: "CronSchedule".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) => validate_cron_schedule(s),
            _ => Ok(()),
        },
    };
    AttributeSchema::new("schedule", cron).with_description("Cron expression for metadata refreshes")
}

/// A port as sent on the wire
pub(crate) fn wire_port(variant: &str, port: i64) -> ParameterResult<u16> {
    u16::try_from(port)
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| ParameterError::encoding(variant, "port", format!("{} is not a valid port", port)))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;

    fn s(v: &str) -> Value {
        Value::string(v)
    }

    fn block(fields: Vec<(&str, Value)>) -> Value {
        Value::Map(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    /// A valid configuration block for each variant, every field set
    pub(crate) fn sample_config(name: &str) -> Value {
        let connection = |extra: Vec<(&str, Value)>| {
            let mut fields = vec![
                ("host", s("db.internal")),
                ("port", Value::Int(1433)),
                ("database", s("analytics")),
                ("credentials", s("db-credentials")),
                ("schedule", s("@daily")),
            ];
            fields.extend(extra);
            block(fields)
        };

        match name {
            "airflow" => block(vec![
                ("host", s("airflow.internal")),
                ("port", Value::Int(8080)),
                ("credentials", s("airflow-credentials")),
                ("schedule", s("@hourly")),
            ]),
            "athena" => block(vec![
                ("datasource", s("AwsDataCatalog")),
                ("database", s("events")),
                ("region", s("eu-west-1")),
                ("role_arn", s("arn:aws:iam::123456789012:role/athena-reader")),
                ("s3_output_location", s("s3://athena-results/queries/")),
                ("workgroup", s("primary")),
                ("vpc_url", s("vpce-0a1b.athena.eu-west-1.vpce.amazonaws.com")),
                ("schedule", s("@daily")),
            ]),
            "bigquery" => block(vec![
                ("project_id", s("p1")),
                ("billing_project_id", s("b1")),
                ("dataset_id", s("analytics")),
                ("credentials", s("cred-name")),
                ("schedule", s("0 2 * * *")),
            ]),
            "databricks" => block(vec![
                ("host", s("dbc-12345.cloud.databricks.com")),
                ("http_path", s("/sql/1.0/warehouses/abc")),
                ("port", Value::Int(443)),
                ("catalogs", Value::List(vec![s("main"), s("finance")])),
                ("credentials", s("databricks-token")),
                ("schedule", s("@daily")),
            ]),
            "dbt" => block(vec![
                ("project_name", s("jaffle_shop")),
                ("target", s("prod")),
                ("schedule", s("@daily")),
            ]),
            "dbtcloud" => block(vec![
                ("account_id", s("70403103932437")),
                ("base_url", s("https://cloud.getdbt.com")),
                ("credentials", s("dbt-cloud-token")),
                ("schedule", s("@daily")),
            ]),
            "fivetran" => block(vec![
                ("host", s("https://api.fivetran.com")),
                ("credentials", s("fivetran-key")),
                ("schedule", s("@daily")),
            ]),
            "looker" => block(vec![
                ("host", s("https://company.cloud.looker.com")),
                (
                    "git_connections",
                    Value::List(vec![Value::Map(HashMap::from([
                        ("url".to_string(), s("git@github.com:company/looker.git")),
                        ("branch".to_string(), s("main")),
                        ("auth_type".to_string(), s("SSH_KEY")),
                    ]))]),
                ),
                ("credentials", s("looker-client")),
                ("schedule", s("@daily")),
            ]),
            "mssql" => connection(vec![("schema", s("dbo"))]),
            "mysql" => connection(vec![("mysql_tls_version", s("TLS_V_1_3"))]),
            "oracle" => connection(vec![]),
            "postgresql" => connection(vec![]),
            "powerbi" => block(vec![
                ("tenant_id", s("00000000-0000-0000-0000-000000000001")),
                ("client_id", s("00000000-0000-0000-0000-000000000002")),
                ("workspace_ids", Value::List(vec![s("ws-1"), s("ws-2")])),
                ("credentials", s("powerbi-secret")),
                ("schedule", s("@daily")),
            ]),
            "quicksight" => block(vec![
                ("account_id", s("123456789012")),
                ("aws_region", s("us-east-1")),
                ("role_arn", s("arn:aws:iam::123456789012:role/quicksight-reader")),
                ("schedule", s("@daily")),
            ]),
            "redshift" => connection(vec![("ssl", Value::Bool(true))]),
            "snowflake" => block(vec![
                ("account_identifier", s("xy12345.eu-west-1")),
                ("warehouse", s("COMPUTE_WH")),
                ("credentials", s("snowflake-key")),
                ("schedule", s("@daily")),
            ]),
            "synapse" => connection(vec![]),
            "tableau" => block(vec![
                ("host", s("https://tableau.company.com")),
                ("site", s("analytics")),
                ("credentials", s("tableau-pat")),
                ("schedule", s("@daily")),
            ]),
            other => panic!("no sample for {}", other),
        }
    }

    fn common() -> CommonFields<'static> {
        CommonFields::new("src1", Some("UTC"))
    }

    #[test]
    fn every_variant_round_trips_through_create_request() {
        for empty in ResolvedParameters::all_empty() {
            let config = sample_config(empty.name());
            let parameters = empty.decode_from_config(&config).unwrap();

            let body = parameters.encode_create_request(&common()).unwrap();
            assert_eq!(body.discriminator(), Some(parameters.wire_tag()));

            let decoded = empty.decode_from_wire(&body).unwrap();
            assert_eq!(decoded, parameters, "round trip of {}", empty.name());
        }
    }

    #[test]
    fn every_variant_round_trips_through_config() {
        for empty in ResolvedParameters::all_empty() {
            let parameters = empty
                .decode_from_config(&sample_config(empty.name()))
                .unwrap();
            let again = empty.decode_from_config(&parameters.to_config()).unwrap();
            assert_eq!(again, parameters, "config round trip of {}", empty.name());
        }
    }

    #[test]
    fn every_variant_validates_its_sample_against_its_schema() {
        let registry = crate::registry::registry();
        for name in registry.all_names() {
            let descriptor = registry.descriptor(name).unwrap();
            let config = sample_config(name);
            assert!(
                descriptor
                    .field_schema
                    .validate(config.as_map().unwrap())
                    .is_ok(),
                "sample of {} does not match its schema",
                name
            );
        }
    }

    #[test]
    fn timezone_is_omitted_where_the_remote_schema_lacks_it() {
        for empty in ResolvedParameters::all_empty() {
            let parameters = empty
                .decode_from_config(&sample_config(empty.name()))
                .unwrap();
            let body = parameters.encode_create_request(&common()).unwrap();
            let expects_timezone = !matches!(empty.name(), "dbt" | "snowflake" | "oracle");
            assert_eq!(parameters.accepts_timezone(), expects_timezone);
            assert_eq!(
                body.contains_key("timezone"),
                expects_timezone,
                "timezone handling of {}",
                empty.name()
            );
            assert!(
                body.keys().all(|k| !body.get(k).is_some_and(|v| v.is_null())),
                "{} sends nulls",
                empty.name()
            );
        }
    }

    #[test]
    fn cron_schedules() {
        assert!(validate_cron_schedule("@daily").is_ok());
        assert!(validate_cron_schedule("0 2 * * *").is_ok());
        assert!(validate_cron_schedule("*/15 * * * 1-5").is_ok());
        assert!(validate_cron_schedule("every day").is_err());
        assert!(validate_cron_schedule("@fortnightly").is_err());
    }

    #[test]
    fn out_of_range_port_cannot_be_encoded() {
        assert_eq!(wire_port("mysql", 3306), Ok(3306));
        assert!(matches!(
            wire_port("mysql", 70000),
            Err(ParameterError::Encoding { field, .. }) if field == "port"
        ));
        assert!(wire_port("mysql", 0).is_err());
    }

    #[test]
    fn schema_violations_surface_as_configuration_errors() {
        let mut config = sample_config("mysql");
        if let Value::Map(fields) = &mut config {
            fields.insert("port".to_string(), Value::Int(99999));
        }
        assert!(matches!(
            MysqlParameters::decode_from_config(&config),
            Err(ParameterError::InvalidConfiguration { field, .. }) if field == "port"
        ));

        let mut config = sample_config("bigquery");
        if let Value::Map(fields) = &mut config {
            fields.insert("warehouse".to_string(), Value::string("x"));
        }
        assert!(matches!(
            BigQueryParameters::decode_from_config(&config),
            Err(ParameterError::InvalidConfiguration { field, .. }) if field == "warehouse"
        ));
    }

    #[test]
    fn decoder_rejects_foreign_discriminator() {
        let bigquery = BigQueryParameters::decode_from_config(&sample_config("bigquery")).unwrap();
        let body = bigquery.encode_create_request(&common()).unwrap();

        let result = SnowflakeParameters::decode_from_wire(&body);
        assert_eq!(
            result,
            Err(ParameterError::UnexpectedVariant {
                expected: "snowflake".to_string(),
                found: "BIGQUERY".to_string(),
            })
        );
    }

    #[test]
    fn decoder_accepts_discriminator_in_any_case() {
        let mut body = sample_wire("postgresql");
        body.insert("type", json!("postgresql"));
        assert!(PostgresqlParameters::decode_from_wire(&body).is_ok());
    }

    #[test]
    fn missing_discriminator_is_malformed() {
        let mut body = sample_wire("mysql");
        body.remove("type");
        assert!(matches!(
            MysqlParameters::decode_from_wire(&body),
            Err(ParameterError::MalformedWire { .. })
        ));
    }

    pub(crate) fn sample_wire(name: &str) -> WireObject {
        let registry = crate::registry::registry();
        let Ok(empty) = registry.create(name) else {
            panic!("unregistered {}", name);
        };
        let parameters = empty.decode_from_config(&sample_config(name)).unwrap();
        let mut body = parameters.encode_create_request(&common()).unwrap();
        body.insert("id", json!("7f6c2f4e-5c1d-4a7e-9a51-3b8f0e1d2c3b"));
        body
    }
}
