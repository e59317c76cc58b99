//! Validator - checks shared by both entry points.

use std::sync::Arc;
use tracing::trace;

use asset_model::{Asset, AssetAttribute, AttributeEvent};

use crate::config::ValidationConfig;
use crate::error::RejectReason;
use crate::ledger::AttributeLedger;
use crate::update::{AssetUpdate, Direction};

/// Applies the freshness, ordering and constraint checks in that order and
/// performs the attribute write when all of them pass.
pub struct Validator {
    future_tolerance_ms: i64,
    ledger: Arc<AttributeLedger>,
}

impl Validator {
    /// Create a validator writing through the given ledger.
    pub fn new(config: &ValidationConfig, ledger: Arc<AttributeLedger>) -> Self {
        Self {
            future_tolerance_ms: config.future_tolerance_ms,
            ledger,
        }
    }

    /// Reject events stamped too far ahead of `now_ms`.
    ///
    /// A far-future event would lock out every legitimate write to the
    /// attribute until that time has passed.
    pub fn check_future(&self, event: &AttributeEvent, now_ms: i64) -> Result<(), RejectReason> {
        let skew_ms = event.timestamp().saturating_sub(now_ms);
        if skew_ms > self.future_tolerance_ms {
            return Err(RejectReason::FutureTimestamp {
                timestamp: event.timestamp(),
                skew_ms,
            });
        }
        Ok(())
    }

    /// Validate `event` against `attribute` and build the processing context.
    ///
    /// On success the attribute (and its copy inside `asset`) carries the new
    /// value and timestamp, and the update starts out `Pending`.
    pub fn validate(
        &self,
        mut asset: Asset,
        mut attribute: AssetAttribute,
        event: &AttributeEvent,
        direction: Direction,
        now_ms: i64,
    ) -> Result<AssetUpdate, RejectReason> {
        self.check_future(event, now_ms)?;

        let previous = self.ledger.compare_and_apply(&mut attribute, event)?;
        trace!(
            attribute = %event.attribute_ref(),
            old_timestamp = previous.timestamp,
            new_timestamp = attribute.timestamp,
            "Attribute written"
        );

        asset
            .attributes
            .insert(attribute.name.clone(), attribute.clone());

        Ok(AssetUpdate::new(asset, attribute, previous, direction))
    }

    pub fn future_tolerance_ms(&self) -> i64 {
        self.future_tolerance_ms
    }
}
