//! Errors raised while resolving, decoding and encoding source parameters

use lantern_core::provider::ProviderError;
use thiserror::Error;

/// Where an error comes from, and therefore how it should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The user's variant selection is malformed; fixable by editing configuration
    ConfigurationShape,
    /// The variant name is not in this build's registry; needs a provider upgrade
    UnknownVariant,
    /// A caller dispatched to the wrong variant; a bug, never the user's fault
    InternalInvariant,
    /// Fields could not be converted to or from the wire representation
    Encoding,
}

/// Errors raised by the source parameters engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("No source parameters set: exactly one of [{}] is required", valid.join(", "))]
    NoVariantSet { valid: Vec<String> },

    #[error(
        "Multiple source parameters set ({}): exactly one of [{}] is allowed",
        set.join(", "),
        valid.join(", ")
    )]
    AmbiguousVariant { set: Vec<String>, valid: Vec<String> },

    #[error("Source parameters '{slot}' are not known yet")]
    UnresolvedVariant { slot: String },

    #[error("Unknown source parameters '{name}': expected one of [{}]", valid.join(", "))]
    UnknownVariant { name: String, valid: Vec<String> },

    #[error("Source parameters '{name}' are registered twice")]
    DuplicateVariant { name: String },

    #[error(
        "Remote source type '{discriminator}' is not supported by this provider version; \
         upgrade the provider to manage it (supported: {})",
        valid.join(", ")
    )]
    UnsupportedRemoteVariant {
        discriminator: String,
        valid: Vec<String>,
    },

    #[error("Internal error: '{expected}' decoder received a '{found}' wire object")]
    UnexpectedVariant { expected: String, found: String },

    #[error("Invalid {variant} parameters, field '{field}': {message}")]
    InvalidConfiguration {
        variant: String,
        field: String,
        message: String,
    },

    #[error("Malformed {variant} wire object, field '{field}': {message}")]
    MalformedWire {
        variant: String,
        field: String,
        message: String,
    },

    #[error("Failed to encode {variant} parameters, field '{field}': {message}")]
    Encoding {
        variant: String,
        field: String,
        message: String,
    },

    #[error("Cannot change source type from '{from}' to '{to}' in place; the source must be replaced")]
    VariantChange { from: String, to: String },
}

impl ParameterError {
    pub fn invalid_configuration(
        variant: &str,
        field: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidConfiguration {
            variant: variant.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn malformed_wire(variant: &str, field: &str, message: impl Into<String>) -> Self {
        Self::MalformedWire {
            variant: variant.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn encoding(variant: &str, field: &str, message: impl Into<String>) -> Self {
        Self::Encoding {
            variant: variant.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoVariantSet { .. }
            | Self::AmbiguousVariant { .. }
            | Self::UnresolvedVariant { .. }
            | Self::InvalidConfiguration { .. }
            | Self::VariantChange { .. } => ErrorKind::ConfigurationShape,
            Self::UnknownVariant { .. } | Self::UnsupportedRemoteVariant { .. } => {
                ErrorKind::UnknownVariant
            }
            Self::UnexpectedVariant { .. } | Self::DuplicateVariant { .. } => {
                ErrorKind::InternalInvariant
            }
            Self::MalformedWire { .. } | Self::Encoding { .. } => ErrorKind::Encoding,
        }
    }

    /// Whether the user can fix this error by editing configuration
    pub fn is_user_facing(&self) -> bool {
        self.kind() != ErrorKind::InternalInvariant
    }
}

impl From<ParameterError> for ProviderError {
    fn from(error: ParameterError) -> Self {
        let message = if error.is_user_facing() {
            error.to_string()
        } else {
            format!("{} (please report this issue)", error)
        };
        ProviderError::new(message).with_cause(error)
    }
}

/// Result type for source parameter operations
pub type ParameterResult<T> = Result<T, ParameterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_errors_list_valid_names() {
        let error = ParameterError::NoVariantSet {
            valid: vec!["bigquery".to_string(), "mysql".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "No source parameters set: exactly one of [bigquery, mysql] is required"
        );
        assert_eq!(error.kind(), ErrorKind::ConfigurationShape);
    }

    #[test]
    fn unexpected_variant_is_internal() {
        let error = ParameterError::UnexpectedVariant {
            expected: "bigquery".to_string(),
            found: "SNOWFLAKE".to_string(),
        };
        assert_eq!(error.kind(), ErrorKind::InternalInvariant);
        assert!(!error.is_user_facing());

        let provider_error: ProviderError = error.into();
        assert!(provider_error.message.contains("please report"));
        assert!(std::error::Error::source(&provider_error).is_some());
    }

    #[test]
    fn unsupported_remote_variant_is_actionable() {
        let error = ParameterError::UnsupportedRemoteVariant {
            discriminator: "CLICKHOUSE".to_string(),
            valid: vec!["bigquery".to_string()],
        };
        assert!(error.to_string().contains("upgrade the provider"));
        assert_eq!(error.kind(), ErrorKind::UnknownVariant);
    }
}
