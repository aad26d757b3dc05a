//! Replace-versus-update planning for source parameters
//!
//! The remote API models every variant as a distinct entity type, so a source
//! whose variant changes can only be destroyed and recreated. Everything here
//! runs on local data before any remote call.

use std::fmt;

use crate::case_convert::canonical_variant_name;
use crate::container::ParameterContainer;
use crate::error::{ParameterError, ParameterResult};

/// What a proposed variant means for an existing source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeImpact {
    /// The variant differs from the prior one; destroy and recreate
    RequiresReplace,
    /// Same variant; update in place
    RequiresUpdate,
    /// Nothing exists yet
    NoPriorState,
}

impl fmt::Display for ChangeImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeImpact::RequiresReplace => write!(f, "requires replace"),
            ChangeImpact::RequiresUpdate => write!(f, "update in place"),
            ChangeImpact::NoPriorState => write!(f, "create"),
        }
    }
}

/// Classify a variant change
///
/// Names are compared in canonical form, so a prior name recorded from a wire
/// discriminator (`DBT_CLOUD`) matches its configuration name (`dbtcloud`).
pub fn classify(prior: Option<&str>, proposed: &str) -> ChangeImpact {
    match prior {
        None => ChangeImpact::NoPriorState,
        Some(prior) if canonical_variant_name(prior) == canonical_variant_name(proposed) => {
            ChangeImpact::RequiresUpdate
        }
        Some(_) => ChangeImpact::RequiresReplace,
    }
}

/// Outcome of resolving the variant name while planning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EarlyResolution {
    /// The set slot is known
    Resolved(&'static str),
    /// Which slot is set depends on values not known until apply
    Deferred { slot: String },
}

impl EarlyResolution {
    pub fn name(&self) -> Option<&'static str> {
        match self {
            EarlyResolution::Resolved(name) => Some(*name),
            EarlyResolution::Deferred { .. } => None,
        }
    }
}

/// Resolve which variant a planned container selects
///
/// Only the slot choice has to be known; unknown values inside the chosen
/// block are fine. When the choice itself is unknown the result is
/// `Deferred`, which callers skip rather than fail the plan on. Shape errors
/// (no slot or several slots set) are still errors.
pub fn resolve_active_name_early(
    container: &ParameterContainer<'_>,
) -> ParameterResult<EarlyResolution> {
    match container.active_name() {
        Ok(name) => Ok(EarlyResolution::Resolved(name)),
        Err(ParameterError::UnresolvedVariant { slot }) => {
            log::debug!("variant choice depends on '{}', deferring to apply", slot);
            Ok(EarlyResolution::Deferred { slot })
        }
        Err(e) => Err(e),
    }
}

/// Planning outcome for one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    pub variant: EarlyResolution,
    /// `None` when the variant is deferred and a prior state exists
    pub impact: Option<ChangeImpact>,
}

/// Plan a source against the variant recorded in its prior state
pub fn plan_change(
    prior: Option<&str>,
    container: &ParameterContainer<'_>,
) -> ParameterResult<PlannedChange> {
    let variant = resolve_active_name_early(container)?;
    let impact = match (&variant, prior) {
        (_, None) => Some(ChangeImpact::NoPriorState),
        (EarlyResolution::Resolved(name), prior) => Some(classify(prior, name)),
        (EarlyResolution::Deferred { .. }, Some(_)) => None,
    };
    Ok(PlannedChange { variant, impact })
}
