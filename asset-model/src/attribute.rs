//! Asset attributes and their meta flags.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constraint::ValueConstraint;
use crate::error::ModelError;
use crate::value::{kind_of, ValueType};

/// Timestamp of an attribute that has never been written.
pub const NEVER_UPDATED: i64 = -1;

fn never_updated() -> i64 {
    NEVER_UPDATED
}

/// Link from an attribute to a protocol configuration on an agent asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentLink {
    /// ID of the agent asset
    pub agent_id: String,
    /// Name of the protocol configuration attribute on the agent
    pub protocol_configuration: String,
}

impl AgentLink {
    /// Create a new link.
    pub fn new(agent_id: impl Into<String>, protocol_configuration: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            protocol_configuration: protocol_configuration.into(),
        }
    }
}

/// Behavioral flags of an attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeMeta {
    /// Users and rules may not write this attribute directly
    #[serde(default)]
    pub read_only: bool,
    /// Current value is kept as a fact in rule sessions
    #[serde(default)]
    pub rules_fact: bool,
    /// Each change is inserted into rule sessions as an event
    #[serde(default)]
    pub rules_event: bool,
    /// Each change is recorded as a time-series datapoint
    #[serde(default)]
    pub store_datapoints: bool,
    /// This attribute (on an agent) is a protocol configuration
    #[serde(default)]
    pub protocol_configuration: bool,
    /// Agent protocol that owns this attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_link: Option<AgentLink>,
}

/// A named, typed, timestamped value owned by an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAttribute {
    /// Attribute name
    pub name: String,
    /// Declared value type
    #[serde(default)]
    pub value_type: ValueType,
    /// Current value (`null` when unset)
    #[serde(default)]
    pub value: Value,
    /// Timestamp of the last accepted write, or [`NEVER_UPDATED`]
    #[serde(default = "never_updated")]
    pub timestamp: i64,
    /// Meta flags
    #[serde(default)]
    pub meta: AttributeMeta,
    /// Constraints checked on write
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ValueConstraint>,
}

impl AssetAttribute {
    /// Create an unset attribute.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            value: Value::Null,
            timestamp: NEVER_UPDATED,
            meta: AttributeMeta::default(),
            constraints: Vec::new(),
        }
    }

    /// Set an initial value without validation (asset creation).
    pub fn with_value(mut self, value: Value, timestamp: i64) -> Self {
        self.value = value;
        self.timestamp = timestamp;
        self
    }

    /// Mark read-only.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.meta.read_only = read_only;
        self
    }

    /// Mark as a rules fact.
    pub fn with_rules_fact(mut self, rules_fact: bool) -> Self {
        self.meta.rules_fact = rules_fact;
        self
    }

    /// Mark as a rules event.
    pub fn with_rules_event(mut self, rules_event: bool) -> Self {
        self.meta.rules_event = rules_event;
        self
    }

    /// Enable datapoint recording.
    pub fn with_datapoints(mut self, store_datapoints: bool) -> Self {
        self.meta.store_datapoints = store_datapoints;
        self
    }

    /// Link to an agent protocol configuration.
    pub fn with_agent_link(mut self, link: AgentLink) -> Self {
        self.meta.agent_link = Some(link);
        self
    }

    /// Mark as a protocol configuration (agent assets only).
    pub fn as_protocol_configuration(mut self) -> Self {
        self.meta.protocol_configuration = true;
        self
    }

    /// Add a constraint.
    pub fn with_constraint(mut self, constraint: ValueConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.meta.read_only
    }

    pub fn is_rules_fact(&self) -> bool {
        self.meta.rules_fact
    }

    pub fn is_rules_event(&self) -> bool {
        self.meta.rules_event
    }

    pub fn is_storing_datapoints(&self) -> bool {
        self.meta.store_datapoints
    }

    pub fn is_protocol_configuration(&self) -> bool {
        self.meta.protocol_configuration
    }

    pub fn agent_link(&self) -> Option<&AgentLink> {
        self.meta.agent_link.as_ref()
    }

    /// Whether the attribute has ever been written.
    pub fn has_been_updated(&self) -> bool {
        self.timestamp >= 0
    }

    /// Check a candidate value against type and constraints.
    pub fn validate(&self, value: &Value) -> Result<(), ModelError> {
        if !self.value_type.accepts(value) {
            return Err(ModelError::TypeMismatch {
                attribute: self.name.clone(),
                expected: self.value_type,
                actual: kind_of(value).to_string(),
            });
        }
        for constraint in &self.constraints {
            constraint
                .check(value)
                .map_err(|reason| ModelError::ConstraintViolation {
                    attribute: self.name.clone(),
                    reason,
                })?;
        }
        Ok(())
    }

    /// Validate and apply a new value with its timestamp.
    ///
    /// On error the attribute is left untouched.
    pub fn set_value(&mut self, value: Value, timestamp: i64) -> Result<(), ModelError> {
        self.validate(&value)?;
        self.value = value;
        self.timestamp = timestamp;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn thermostat() -> AssetAttribute {
        AssetAttribute::new("setpoint", ValueType::Number).with_constraint(ValueConstraint::Range {
            min: Some(5.0),
            max: Some(30.0),
        })
    }

    #[test]
    fn test_new_attribute_is_never_updated() {
        let attribute = thermostat();
        assert_eq!(attribute.timestamp, NEVER_UPDATED);
        assert!(!attribute.has_been_updated());
        assert!(attribute.value.is_null());
    }

    #[test]
    fn test_set_value() {
        let mut attribute = thermostat();
        attribute.set_value(json!(21.5), 1000).unwrap();
        assert_eq!(attribute.value, json!(21.5));
        assert_eq!(attribute.timestamp, 1000);
        assert!(attribute.has_been_updated());
    }

    #[test]
    fn test_rejected_value_leaves_attribute_untouched() {
        let mut attribute = thermostat().with_value(json!(20), 500);

        let err = attribute.set_value(json!("hot"), 1000).unwrap_err();
        assert!(matches!(err, ModelError::TypeMismatch { .. }));

        let err = attribute.set_value(json!(45), 1000).unwrap_err();
        assert!(matches!(err, ModelError::ConstraintViolation { .. }));

        assert_eq!(attribute.value, json!(20));
        assert_eq!(attribute.timestamp, 500);
    }

    #[test]
    fn test_meta_defaults_from_yaml() {
        let yaml = r#"
name: power
value_type: boolean
meta:
  read_only: true
  agent_link:
    agent_id: agent-1
    protocol_configuration: knx
"#;
        let attribute: AssetAttribute = serde_yaml::from_str(yaml).unwrap();
        assert!(attribute.is_read_only());
        assert!(!attribute.is_rules_fact());
        assert_eq!(attribute.timestamp, NEVER_UPDATED);
        assert_eq!(attribute.agent_link().unwrap().agent_id, "agent-1");
    }
}
