//! Variant registry
//!
//! Maps each variant's canonical name to its descriptor. The builtin table is
//! built from one explicit list (`builtin_descriptors`) and cached for the life
//! of the process; it is never mutated after construction.
//!
//! Lookups use the canonical lowercase name only. Discriminators coming off the
//! wire (`BIGQUERY`, `DBT_CLOUD`) must go through
//! [`canonical_variant_name`](crate::case_convert::canonical_variant_name)
//! first; `ParameterContainer::from_wire_response` does this.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use lantern_core::schema::ResourceSchema;

use crate::case_convert::canonical_variant_name;
use crate::error::{ParameterError, ParameterResult};
use crate::parameters::{
    ResolvedParameters, airflow, athena, bigquery, databricks, dbt, dbtcloud, fivetran, looker,
    mssql, mysql, oracle, postgresql, powerbi, quicksight, redshift, snowflake, synapse, tableau,
};

/// Immutable description of one variant
#[derive(Debug, Clone)]
pub struct VariantDescriptor {
    /// Canonical lowercase name, also the configuration slot key
    pub name: &'static str,
    /// Discriminator used by the remote API
    pub wire_tag: &'static str,
    /// Schema of the variant's configuration block
    pub field_schema: ResourceSchema,
    /// Whether the variant references a stored credential
    pub requires_secret_reference: bool,
    /// Produces an empty instance of the variant
    pub factory: fn() -> ResolvedParameters,
}

fn builtin_descriptors() -> Vec<VariantDescriptor> {
    vec![
        airflow::descriptor(),
        athena::descriptor(),
        bigquery::descriptor(),
        databricks::descriptor(),
        dbt::descriptor(),
        dbtcloud::descriptor(),
        fivetran::descriptor(),
        looker::descriptor(),
        mssql::descriptor(),
        mysql::descriptor(),
        oracle::descriptor(),
        postgresql::descriptor(),
        powerbi::descriptor(),
        quicksight::descriptor(),
        redshift::descriptor(),
        snowflake::descriptor(),
        synapse::descriptor(),
        tableau::descriptor(),
    ]
}

/// Table of known variants keyed by canonical name
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    variants: BTreeMap<&'static str, VariantDescriptor>,
}

impl VariantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of every variant this build supports
    pub fn try_builtin() -> ParameterResult<Self> {
        let mut registry = Self::new();
        for descriptor in builtin_descriptors() {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Like `try_builtin`, keeping the first registration of a duplicated name
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for descriptor in builtin_descriptors() {
            if let Err(e) = registry.register(descriptor) {
                log::error!("Failed to build variant registry: {}", e);
            }
        }
        registry
    }

    /// Add a variant; its name must be canonical and not yet registered
    pub fn register(&mut self, descriptor: VariantDescriptor) -> ParameterResult<()> {
        let name = descriptor.name;
        if name.is_empty() || name != canonical_variant_name(name) {
            return Err(ParameterError::UnknownVariant {
                name: name.to_string(),
                valid: self.valid_names(),
            });
        }
        if self.variants.contains_key(name) {
            return Err(ParameterError::DuplicateVariant {
                name: name.to_string(),
            });
        }
        log::debug!("registered source variant '{}'", name);
        self.variants.insert(name, descriptor);
        Ok(())
    }

    /// An empty instance of the named variant
    pub fn create(&self, name: &str) -> ParameterResult<ResolvedParameters> {
        self.descriptor(name).map(|d| (d.factory)())
    }

    pub fn descriptor(&self, name: &str) -> ParameterResult<&VariantDescriptor> {
        self.variants
            .get(name)
            .ok_or_else(|| ParameterError::UnknownVariant {
                name: name.to_string(),
                valid: self.valid_names(),
            })
    }

    /// Every registered name, in sorted order
    pub fn all_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.variants.keys().copied()
    }

    pub fn valid_names(&self) -> Vec<String> {
        self.all_names().map(str::to_string).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variants.contains_key(name)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &VariantDescriptor> {
        self.variants.values()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

static REGISTRY: OnceLock<VariantRegistry> = OnceLock::new();

/// The process-wide builtin registry
pub fn registry() -> &'static VariantRegistry {
    REGISTRY.get_or_init(VariantRegistry::builtin)
}
