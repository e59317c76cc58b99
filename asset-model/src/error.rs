//! Error types for the asset model.

use crate::value::ValueType;

/// Errors raised when a value is applied to an attribute.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Value does not match the attribute's declared type
    #[error("Type mismatch on '{attribute}': expected {expected:?}, got {actual}")]
    TypeMismatch {
        attribute: String,
        expected: ValueType,
        actual: String,
    },

    /// Value violates one of the attribute's constraints
    #[error("Constraint violation on '{attribute}': {reason}")]
    ConstraintViolation { attribute: String, reason: String },
}
