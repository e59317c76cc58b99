//! Value constraints checked when an attribute is written.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A constraint an attribute value must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueConstraint {
    /// Value must not be `null`
    Required,
    /// Numeric value within an inclusive range
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// Value must equal one of the allowed values
    OneOf { values: Vec<Value> },
    /// Maximum length of a string (in chars) or array (in elements)
    MaxLength { max: usize },
}

impl ValueConstraint {
    /// Check a value, returning the reason for a violation.
    ///
    /// Only `Required` looks at `null`; every other constraint lets it pass.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            ValueConstraint::Required => {
                if value.is_null() {
                    return Err("value is required".to_string());
                }
            }
            _ if value.is_null() => {}
            ValueConstraint::Range { min, max } => {
                let Some(number) = value.as_f64() else {
                    return Err(format!("range constraint needs a number, got {}", value));
                };
                if let Some(min) = min {
                    if number < *min {
                        return Err(format!("{} is below minimum {}", number, min));
                    }
                }
                if let Some(max) = max {
                    if number > *max {
                        return Err(format!("{} is above maximum {}", number, max));
                    }
                }
            }
            ValueConstraint::OneOf { values } => {
                if !values.contains(value) {
                    return Err(format!("{} is not one of the allowed values", value));
                }
            }
            ValueConstraint::MaxLength { max } => {
                let length = match value {
                    Value::String(s) => s.chars().count(),
                    Value::Array(items) => items.len(),
                    other => {
                        return Err(format!("length constraint needs a string or array, got {}", other))
                    }
                };
                if length > *max {
                    return Err(format!("length {} exceeds maximum {}", length, max));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_range() {
        let range = ValueConstraint::Range {
            min: Some(0.0),
            max: Some(100.0),
        };
        assert!(range.check(&json!(50)).is_ok());
        assert!(range.check(&json!(-0.5)).is_err());
        assert!(range.check(&json!(100.1)).is_err());
        assert!(range.check(&json!("fifty")).is_err());
        assert!(range.check(&Value::Null).is_ok());
    }

    #[test]
    fn test_one_of() {
        let modes = ValueConstraint::OneOf {
            values: vec![json!("auto"), json!("manual")],
        };
        assert!(modes.check(&json!("auto")).is_ok());
        assert!(modes.check(&json!("off")).is_err());
    }

    #[test]
    fn test_max_length() {
        let max = ValueConstraint::MaxLength { max: 3 };
        assert!(max.check(&json!("abc")).is_ok());
        assert!(max.check(&json!("abcd")).is_err());
        assert!(max.check(&json!([1, 2, 3, 4])).is_err());
        assert!(max.check(&json!(12)).is_err());
    }

    #[test]
    fn test_required() {
        assert!(ValueConstraint::Required.check(&Value::Null).is_err());
        assert!(ValueConstraint::Required.check(&json!(false)).is_ok());
    }

    #[test]
    fn test_tagged_yaml() {
        let yaml = "kind: range\nmin: 5.0\n";
        let parsed: ValueConstraint = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            parsed,
            ValueConstraint::Range {
                min: Some(5.0),
                max: None
            }
        );
    }
}
