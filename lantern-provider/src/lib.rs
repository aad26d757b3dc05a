//! Lantern Provider
//!
//! Manages metadata sources. A source is one of several variants (BigQuery,
//! Snowflake, dbt, ...), chosen by setting exactly one block under
//! `parameters`. This crate resolves that choice, converts the chosen block to
//! and from the remote API's tagged JSON, and decides when a change of variant
//! forces a replacement.

pub mod api;
pub mod case_convert;
pub mod config;
pub mod container;
pub mod error;
pub mod parameters;
pub mod planner;
pub mod registry;
pub mod source;
pub mod wire;

pub use api::{ApiError, SourceApi};
pub use container::ParameterContainer;
pub use error::{ErrorKind, ParameterError, ParameterResult};
pub use parameters::{ResolvedParameters, VariantParameters};
pub use planner::{ChangeImpact, EarlyResolution, PlannedChange, classify, plan_change};
pub use registry::{VariantDescriptor, VariantRegistry, registry};
pub use source::{SOURCE_RESOURCE_TYPE, SourceProvider, SourceType};
pub use wire::WireObject;
