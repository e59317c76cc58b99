//! Value types for attribute payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of an attribute value.
///
/// Payloads travel as dynamically-typed JSON values; the declared type is
/// checked whenever a new value is applied to an attribute. `null` is
/// accepted by every type and means "no value".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Any JSON value
    #[default]
    Any,
    /// `true` / `false`
    Boolean,
    /// Any JSON number
    Number,
    /// Whole numbers only
    Integer,
    /// Text
    String,
    /// JSON object
    Object,
    /// JSON array
    Array,
}

impl ValueType {
    /// Whether `value` is compatible with this type.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            ValueType::Any => true,
            ValueType::Boolean => value.is_boolean(),
            ValueType::Number => value.is_number(),
            ValueType::Integer => value.is_i64() || value.is_u64(),
            ValueType::String => value.is_string(),
            ValueType::Object => value.is_object(),
            ValueType::Array => value.is_array(),
        }
    }
}

/// Short name of the JSON kind of `value`, for diagnostics.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_accepts_integers_and_floats() {
        assert!(ValueType::Number.accepts(&json!(21.5)));
        assert!(ValueType::Number.accepts(&json!(21)));
        assert!(!ValueType::Number.accepts(&json!("21")));
    }

    #[test]
    fn test_integer_rejects_floats() {
        assert!(ValueType::Integer.accepts(&json!(3)));
        assert!(!ValueType::Integer.accepts(&json!(3.5)));
    }

    #[test]
    fn test_null_is_always_accepted() {
        for value_type in [ValueType::Boolean, ValueType::String, ValueType::Object] {
            assert!(value_type.accepts(&Value::Null));
        }
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(kind_of(&json!(1.5)), "number");
        assert_eq!(kind_of(&json!(1)), "integer");
        assert_eq!(kind_of(&json!({"a": 1})), "object");
    }
}
