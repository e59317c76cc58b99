//! Attribute events - immutable proposals to change one attribute.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifies one attribute of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeRef {
    /// Asset ID
    pub entity_id: String,
    /// Attribute name, unique within the asset
    pub attribute_name: String,
}

impl AttributeRef {
    /// Create a new reference.
    pub fn new(entity_id: impl Into<String>, attribute_name: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            attribute_name: attribute_name.into(),
        }
    }
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_id, self.attribute_name)
    }
}

/// A timestamped value change for one attribute.
///
/// Fields are private: an event is never modified after it is created.
/// The timestamp is assigned by the producer (protocol, rule or client)
/// in milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeEvent {
    entity_id: String,
    attribute_name: String,
    #[serde(default)]
    value: Value,
    timestamp: i64,
}

impl AttributeEvent {
    /// Create a new event.
    pub fn new(
        entity_id: impl Into<String>,
        attribute_name: impl Into<String>,
        value: Value,
        timestamp: i64,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            attribute_name: attribute_name.into(),
            value,
            timestamp,
        }
    }

    /// Create an event stamped with the current time.
    pub fn now(entity_id: impl Into<String>, attribute_name: impl Into<String>, value: Value) -> Self {
        Self::new(entity_id, attribute_name, value, crate::now_millis())
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Reference to the attribute this event targets.
    pub fn attribute_ref(&self) -> AttributeRef {
        AttributeRef::new(&self.entity_id, &self.attribute_name)
    }
}

impl fmt::Display for AttributeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AttributeEvent{{{}:{}={} @{}}}",
            self.entity_id, self.attribute_name, self.value, self.timestamp
        )
    }
}
