//! Error types for the processing pipeline.
//!
//! Two families:
//!
//! - [`RejectReason`]: why an event was dropped before reaching the chain.
//!   Never returned to the caller; logged and counted.
//! - [`ProcessingError`]: fatal conditions returned to the caller.

use asset_model::{AttributeRef, ModelError};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Why an event was dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectReason {
    /// Referenced asset does not exist
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Referenced attribute does not exist on the asset
    #[error("Attribute not found: {0}")]
    AttributeNotFound(AttributeRef),

    /// Direct write to a read-only attribute
    #[error("Attribute is read-only: {0}")]
    ReadOnly(AttributeRef),

    /// Sensor update for an attribute no longer linked to an agent
    #[error("Attribute not linked to an agent: {0}")]
    Unlinked(AttributeRef),

    /// Event time too far ahead of the local clock
    #[error("Event time {timestamp} is {skew_ms}ms in the future")]
    FutureTimestamp { timestamp: i64, skew_ms: i64 },

    /// Event time not newer than the attribute's last update
    #[error("Event time {timestamp} is not newer than last update {last_timestamp}")]
    StaleTimestamp { timestamp: i64, last_timestamp: i64 },

    /// Value rejected by the attribute's type or constraints
    #[error(transparent)]
    ConstraintViolation(#[from] ModelError),
}

impl RejectReason {
    /// Category of this rejection.
    pub fn kind(&self) -> RejectKind {
        match self {
            RejectReason::AssetNotFound(_) | RejectReason::AttributeNotFound(_) => {
                RejectKind::NotFound
            }
            RejectReason::ReadOnly(_) => RejectKind::Forbidden,
            RejectReason::Unlinked(_) => RejectKind::Unlinked,
            RejectReason::FutureTimestamp { .. } => RejectKind::FutureTimestamp,
            RejectReason::StaleTimestamp { .. } => RejectKind::StaleTimestamp,
            RejectReason::ConstraintViolation(_) => RejectKind::ConstraintViolation,
        }
    }
}

/// Categories of dropped events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectKind {
    NotFound,
    Forbidden,
    Unlinked,
    FutureTimestamp,
    StaleTimestamp,
    ConstraintViolation,
}

/// Failure reported by a processor in the chain.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProcessorError {
    /// Rule evaluation failed
    #[error("Rules error: {0}")]
    Rules(String),

    /// Command could not be dispatched to the owning agent
    #[error("Agent dispatch error: {0}")]
    Dispatch(String),

    /// Attribute could not be persisted
    #[error("Storage error: {0}")]
    Storage(String),

    /// Datapoint could not be recorded
    #[error("Datapoint error: {0}")]
    Datapoint(String),

    /// Processor panicked
    #[error("Processor panicked: {0}")]
    Panicked(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

/// Fatal errors returned to the caller of an entry point.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    /// Operation not permitted on this asset
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A processor failed; earlier processors' side effects are not undone
    #[error("Processor '{processor}' failed on {attribute_ref} in asset '{asset_name}': {source}")]
    ConsumerFailure {
        processor: String,
        attribute_ref: AttributeRef,
        asset_name: String,
        #[source]
        source: ProcessorError,
    },

    /// Asset lookup failed
    #[error("Asset store error: {0}")]
    Store(#[from] StoreError),

    /// Service misconfigured
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProcessingError {
    /// Name of the failed processor, for consumer failures.
    pub fn processor(&self) -> Option<&str> {
        match self {
            ProcessingError::ConsumerFailure { processor, .. } => Some(processor),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_reject_kinds() {
        let attribute_ref = AttributeRef::new("a", "b");
        assert_eq!(
            RejectReason::AssetNotFound("a".into()).kind(),
            RejectKind::NotFound
        );
        assert_eq!(
            RejectReason::ReadOnly(attribute_ref.clone()).kind(),
            RejectKind::Forbidden
        );
        assert_eq!(
            RejectReason::StaleTimestamp {
                timestamp: 1,
                last_timestamp: 2
            }
            .kind(),
            RejectKind::StaleTimestamp
        );
        assert_eq!(
            RejectReason::Unlinked(attribute_ref).kind(),
            RejectKind::Unlinked
        );
    }

    #[test]
    fn test_consumer_failure_keeps_cause() {
        let err = ProcessingError::ConsumerFailure {
            processor: "storage".into(),
            attribute_ref: AttributeRef::new("a", "b"),
            asset_name: "Kitchen".into(),
            source: ProcessorError::Storage("disk full".into()),
        };
        assert_eq!(err.processor(), Some("storage"));
        assert!(err.to_string().contains("a:b"));
        assert_eq!(err.source().unwrap().to_string(), "Storage error: disk full");
    }
}
