//! Attribute ledger - last accepted state per attribute.
//!
//! The ledger is the single place where the ordering check and the write
//! happen together. Each attribute's entry is locked for the duration of
//! compare, validate and apply, so two concurrent events for the same
//! attribute can never both pass the timestamp check.

use dashmap::DashMap;
use serde_json::Value;

use asset_model::{AssetAttribute, AttributeEvent, AttributeRef, NEVER_UPDATED};

use crate::error::RejectReason;

/// Value and timestamp of an attribute at some point.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRecord {
    /// Value (`null` when unset)
    pub value: Value,
    /// Timestamp, or [`NEVER_UPDATED`]
    pub timestamp: i64,
}

impl AttributeRecord {
    /// Create a record.
    pub fn new(value: Value, timestamp: i64) -> Self {
        Self { value, timestamp }
    }

    /// Snapshot of an attribute's current state.
    pub fn of(attribute: &AssetAttribute) -> Self {
        Self::new(attribute.value.clone(), attribute.timestamp)
    }

    /// Whether anything has been written.
    pub fn has_been_updated(&self) -> bool {
        self.timestamp >= 0
    }
}

impl Default for AttributeRecord {
    fn default() -> Self {
        Self::new(Value::Null, NEVER_UPDATED)
    }
}

/// Last accepted state of every attribute that has seen an event.
pub struct AttributeLedger {
    records: DashMap<AttributeRef, AttributeRecord>,
}

impl AttributeLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Check ordering and constraints, then write the event to `attribute`.
    ///
    /// The newer of the ledger entry and the attribute snapshot is taken as
    /// the attribute's last state: the snapshot may lag behind events whose
    /// storage has not committed yet. On success the attribute holds the new
    /// value and the previous state is returned. On rejection neither the
    /// attribute nor the ledger changes.
    pub fn compare_and_apply(
        &self,
        attribute: &mut AssetAttribute,
        event: &AttributeEvent,
    ) -> Result<AttributeRecord, RejectReason> {
        let mut entry = self
            .records
            .entry(event.attribute_ref())
            .or_insert_with(|| AttributeRecord::of(attribute));

        if entry.timestamp > attribute.timestamp {
            attribute.value = entry.value.clone();
            attribute.timestamp = entry.timestamp;
        }
        let previous = AttributeRecord::of(attribute);

        if previous.has_been_updated() && event.timestamp() <= previous.timestamp {
            return Err(RejectReason::StaleTimestamp {
                timestamp: event.timestamp(),
                last_timestamp: previous.timestamp,
            });
        }

        let mut candidate = attribute.clone();
        candidate.set_value(event.value().clone(), event.timestamp())?;

        *entry = AttributeRecord::of(&candidate);
        *attribute = candidate;
        Ok(previous)
    }

    /// Last accepted state of an attribute.
    pub fn get(&self, attribute_ref: &AttributeRef) -> Option<AttributeRecord> {
        self.records.get(attribute_ref).map(|r| r.value().clone())
    }

    /// Drop all entries of an asset (e.g. after it was deleted or replaced).
    pub fn forget_asset(&self, entity_id: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|k, _| k.entity_id != entity_id);
        before - self.records.len()
    }

    /// Number of tracked attributes.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for AttributeLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_model::{ValueConstraint, ValueType};
    use serde_json::json;
    use std::sync::Arc;

    fn temperature() -> AssetAttribute {
        AssetAttribute::new("temperature", ValueType::Number)
    }

    #[test]
    fn test_first_write_from_sentinel() {
        let ledger = AttributeLedger::new();
        let mut attribute = temperature();
        let event = AttributeEvent::new("room", "temperature", json!(21.5), 1000);

        let previous = ledger.compare_and_apply(&mut attribute, &event).unwrap();

        assert_eq!(previous, AttributeRecord::default());
        assert_eq!(attribute.value, json!(21.5));
        assert_eq!(attribute.timestamp, 1000);
        assert_eq!(
            ledger.get(&event.attribute_ref()),
            Some(AttributeRecord::new(json!(21.5), 1000))
        );
    }

    #[test]
    fn test_older_event_rejected_against_stale_snapshot() {
        let ledger = AttributeLedger::new();
        let mut first = temperature();
        ledger
            .compare_and_apply(&mut first, &AttributeEvent::new("room", "temperature", json!(21.5), 1000))
            .unwrap();

        // A second caller still holds the unwritten snapshot.
        let mut stale_snapshot = temperature();
        let err = ledger
            .compare_and_apply(
                &mut stale_snapshot,
                &AttributeEvent::new("room", "temperature", json!(22.0), 999),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            RejectReason::StaleTimestamp {
                timestamp: 999,
                last_timestamp: 1000
            }
        ));
        assert_eq!(
            ledger.get(&AttributeRef::new("room", "temperature")).unwrap().value,
            json!(21.5)
        );
    }

    #[test]
    fn test_equal_timestamp_is_stale() {
        let ledger = AttributeLedger::new();
        let mut attribute = temperature().with_value(json!(20), 500);
        let err = ledger
            .compare_and_apply(&mut attribute, &AttributeEvent::new("room", "temperature", json!(20), 500))
            .unwrap_err();
        assert!(matches!(err, RejectReason::StaleTimestamp { .. }));
        assert!(ledger.get(&AttributeRef::new("room", "temperature")).is_some());
    }

    #[test]
    fn test_constraint_violation_leaves_state_untouched() {
        let ledger = AttributeLedger::new();
        let mut attribute = temperature()
            .with_constraint(ValueConstraint::Range {
                min: None,
                max: Some(50.0),
            })
            .with_value(json!(20), 500);

        let err = ledger
            .compare_and_apply(&mut attribute, &AttributeEvent::new("room", "temperature", json!(90), 600))
            .unwrap_err();

        assert!(matches!(err, RejectReason::ConstraintViolation(_)));
        assert_eq!(attribute.value, json!(20));
        assert_eq!(attribute.timestamp, 500);
        assert_eq!(
            ledger.get(&AttributeRef::new("room", "temperature")).unwrap().timestamp,
            500
        );
    }

    #[test]
    fn test_forget_asset() {
        let ledger = AttributeLedger::new();
        for (entity, name) in [("a", "x"), ("a", "y"), ("b", "x")] {
            let mut attribute = AssetAttribute::new(name, ValueType::Any);
            ledger
                .compare_and_apply(&mut attribute, &AttributeEvent::new(entity, name, json!(1), 1))
                .unwrap();
        }
        assert_eq!(ledger.forget_asset("a"), 2);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_concurrent_same_timestamp_accepts_exactly_one() {
        let ledger = Arc::new(AttributeLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    let mut attribute = temperature();
                    let event = AttributeEvent::new("room", "temperature", json!(i), 1000);
                    ledger.compare_and_apply(&mut attribute, &event).is_ok()
                })
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
    }
}
