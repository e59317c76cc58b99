//! AssetUpdate - the per-event processing context.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

use asset_model::{Asset, AssetAttribute, AttributeEvent, AttributeRef};

use crate::error::ProcessorError;
use crate::ledger::AttributeRecord;

/// Which way an update is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// From a protocol towards the system (sensor reading)
    Northbound,
    /// From a user or rule towards a device
    Southbound,
}

/// Status of an update's traversal of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    /// Not yet offered to any processor
    #[default]
    Pending,
    /// Keep going
    Continue,
    /// No further rule sessions, but the rest of the chain continues
    RulesHandled,
    /// A processor took ownership; stop the chain
    Handled,
    /// A processor failed; stop the chain and escalate
    Error,
    /// Traversal finished
    Completed,
}

impl UpdateStatus {
    /// Whether this status ends the traversal early.
    pub fn stops_chain(&self) -> bool {
        matches!(self, UpdateStatus::Handled | UpdateStatus::Error)
    }
}

/// Context for one accepted attribute event.
///
/// Built by the [`Validator`](crate::Validator) after the attribute has been
/// written, passed by `&mut` through each processor, then dropped.
#[derive(Debug, Clone)]
pub struct AssetUpdate {
    id: String,
    asset: Asset,
    attribute: AssetAttribute,
    value: Value,
    timestamp: i64,
    old_value: Value,
    old_value_timestamp: i64,
    direction: Direction,
    status: UpdateStatus,
    error: Option<ProcessorError>,
}

impl AssetUpdate {
    /// Create an update from the written attribute and its previous state.
    pub fn new(
        asset: Asset,
        attribute: AssetAttribute,
        previous: AttributeRecord,
        direction: Direction,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            value: attribute.value.clone(),
            timestamp: attribute.timestamp,
            asset,
            attribute,
            old_value: previous.value,
            old_value_timestamp: previous.timestamp,
            direction,
            status: UpdateStatus::Pending,
            error: None,
        }
    }

    /// Unique ID of this traversal, for log correlation.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    pub fn attribute(&self) -> &AssetAttribute {
        &self.attribute
    }

    pub fn attribute_ref(&self) -> AttributeRef {
        AttributeRef::new(&self.asset.id, &self.attribute.name)
    }

    /// Value that will progress through the rest of the chain.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Replace the value seen by later processors (e.g. by a rule).
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn old_value(&self) -> &Value {
        &self.old_value
    }

    pub fn old_value_timestamp(&self) -> i64 {
        self.old_value_timestamp
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_northbound(&self) -> bool {
        self.direction == Direction::Northbound
    }

    pub fn status(&self) -> UpdateStatus {
        self.status
    }

    /// Set the status. `Completed` is reserved for the chain.
    pub fn set_status(&mut self, status: UpdateStatus) {
        if status == UpdateStatus::Completed {
            warn!(update_id = %self.id, "Processors cannot complete an update, ignoring");
            return;
        }
        self.status = status;
    }

    pub fn error(&self) -> Option<&ProcessorError> {
        self.error.as_ref()
    }

    /// Mark the update failed with a cause.
    pub fn fail(&mut self, error: ProcessorError) {
        self.status = UpdateStatus::Error;
        self.error = Some(error);
    }

    /// The current value and timestamp as an event.
    pub fn to_event(&self) -> AttributeEvent {
        AttributeEvent::new(&self.asset.id, &self.attribute.name, self.value.clone(), self.timestamp)
    }

    pub(crate) fn take_error(&mut self) -> Option<ProcessorError> {
        self.error.take()
    }

    pub(crate) fn begin(&mut self) {
        if self.status == UpdateStatus::Pending {
            self.status = UpdateStatus::Continue;
        }
    }

    pub(crate) fn complete(&mut self) {
        self.status = UpdateStatus::Completed;
    }
}

impl fmt::Display for AssetUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AssetUpdate{{id={}, {}:{}={} @{}, old={} @{}, {:?}, {:?}}}",
            self.id,
            self.asset.id,
            self.attribute.name,
            self.value,
            self.timestamp,
            self.old_value,
            self.old_value_timestamp,
            self.direction,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_model::{AssetType, ValueType, NEVER_UPDATED};
    use serde_json::json;

    fn update() -> AssetUpdate {
        let attribute = AssetAttribute::new("temperature", ValueType::Number).with_value(json!(21.5), 1000);
        let asset = Asset::new("Room", AssetType::Thing)
            .with_id("room-1")
            .with_attribute(attribute.clone());
        AssetUpdate::new(
            asset,
            attribute,
            AttributeRecord::new(Value::Null, NEVER_UPDATED),
            Direction::Northbound,
        )
    }

    #[test]
    fn test_new_update_is_pending() {
        let update = update();
        assert_eq!(update.status(), UpdateStatus::Pending);
        assert_eq!(update.value(), &json!(21.5));
        assert_eq!(update.timestamp(), 1000);
        assert!(update.old_value().is_null());
        assert_eq!(update.old_value_timestamp(), NEVER_UPDATED);
        assert!(update.is_northbound());
        assert_eq!(update.attribute_ref(), AttributeRef::new("room-1", "temperature"));
    }

    #[test]
    fn test_processors_cannot_complete() {
        let mut update = update();
        update.set_status(UpdateStatus::Completed);
        assert_eq!(update.status(), UpdateStatus::Pending);

        update.begin();
        assert_eq!(update.status(), UpdateStatus::Continue);
        update.complete();
        assert_eq!(update.status(), UpdateStatus::Completed);
    }

    #[test]
    fn test_fail_records_cause() {
        let mut update = update();
        update.fail(ProcessorError::Other("boom".into()));
        assert_eq!(update.status(), UpdateStatus::Error);
        assert!(update.error().is_some());
        assert!(update.take_error().is_some());
        assert!(update.error().is_none());
    }

    #[test]
    fn test_stops_chain() {
        assert!(UpdateStatus::Handled.stops_chain());
        assert!(UpdateStatus::Error.stops_chain());
        assert!(!UpdateStatus::RulesHandled.stops_chain());
        assert!(!UpdateStatus::Continue.stops_chain());
    }

    #[test]
    fn test_rewritten_value_in_event() {
        let mut update = update();
        update.set_value(json!(22));
        assert_eq!(update.to_event().value(), &json!(22));
        assert_eq!(update.attribute().value, json!(21.5));
    }
}
