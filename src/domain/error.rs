//! Ingestion error taxonomy.
//!
//! Every failure the pipeline can hit is classified here so the
//! scheduler can decide per listing whether to skip, drop a single
//! observation, delete the listing, or abort the run.

use thiserror::Error;

use super::listing::Condition;

/// Errors raised while ingesting one listing (or while starting a run).
#[derive(Debug, Error)]
pub enum IngestError {
    /// Missing or empty credentials / invalid settings. Aborts the run.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network failure, timeout, or a non-success HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Body is not well-formed or lacks the nodes every response carries.
    #[error("parse error: {0}")]
    Parse(String),

    /// Vendor reports the item as permanently inaccessible.
    #[error("item {identifier} is no longer accessible ({code})")]
    NotFound {
        /// Vendor item identifier.
        identifier: String,
        /// Vendor error code.
        code: String,
    },

    /// A single condition's offer cannot be represented.
    #[error("invalid {condition} offer: {reason}")]
    Validation {
        /// Condition the offer was evaluated for.
        condition: Condition,
        /// What was wrong with it.
        reason: String,
    },

    /// Any other vendor-reported error code.
    #[error("vendor error {code}: {message}")]
    Vendor {
        /// Vendor error code.
        code: String,
        /// Human-readable vendor message.
        message: String,
    },

    /// Persistence layer failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl IngestError {
    /// Short, stable label used for log fields and metric labels.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Transport(_) => "transport",
            Self::Parse(_) => "parse",
            Self::NotFound { .. } => "not_found",
            Self::Validation { .. } => "validation",
            Self::Vendor { .. } => "vendor",
            Self::Storage(_) => "storage",
        }
    }

    /// Whether the error must abort the whole run instead of one listing.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<anyhow::Error> for IngestError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(IngestError::Transport("timeout".into()).kind(), "transport");
        assert_eq!(
            IngestError::Validation {
                condition: Condition::Used,
                reason: "no currency".into(),
            }
            .kind(),
            "validation"
        );
    }

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(IngestError::Configuration("AWS_ACCESS_KEY_ID not set".into()).is_fatal());
        assert!(!IngestError::Parse("bad xml".into()).is_fatal());
        assert!(!IngestError::Storage("disk full".into()).is_fatal());
    }

    #[test]
    fn test_anyhow_maps_to_storage() {
        let err: IngestError = anyhow::anyhow!("snapshot write failed").into();
        assert!(matches!(err, IngestError::Storage(ref m) if m.contains("snapshot")));
    }

    #[test]
    fn test_validation_display() {
        let err = IngestError::Validation {
            condition: Condition::Refurb,
            reason: "amount `abc` is not a number".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid refurb offer: amount `abc` is not a number"
        );
    }
}
