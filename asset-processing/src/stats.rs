//! Processing statistics.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::RejectKind;

/// Lock-free counters updated by the service.
#[derive(Debug, Default)]
pub struct ProcessingStats {
    received: AtomicU64,
    accepted: AtomicU64,
    not_found: AtomicU64,
    forbidden: AtomicU64,
    unlinked: AtomicU64,
    future_timestamp: AtomicU64,
    stale_timestamp: AtomicU64,
    constraint_violation: AtomicU64,
    handled: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self, kind: RejectKind) {
        let counter = match kind {
            RejectKind::NotFound => &self.not_found,
            RejectKind::Forbidden => &self.forbidden,
            RejectKind::Unlinked => &self.unlinked,
            RejectKind::FutureTimestamp => &self.future_timestamp,
            RejectKind::StaleTimestamp => &self.stale_timestamp,
            RejectKind::ConstraintViolation => &self.constraint_violation,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// A traversal ended without error; `handled` if it was short-circuited.
    pub fn record_completed(&self, handled: bool) {
        if handled {
            self.handled.fetch_add(1, Ordering::Relaxed);
        }
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            received: load(&self.received),
            accepted: load(&self.accepted),
            rejected: RejectedCounts {
                not_found: load(&self.not_found),
                forbidden: load(&self.forbidden),
                unlinked: load(&self.unlinked),
                future_timestamp: load(&self.future_timestamp),
                stale_timestamp: load(&self.stale_timestamp),
                constraint_violation: load(&self.constraint_violation),
            },
            handled: load(&self.handled),
            completed: load(&self.completed),
            failed: load(&self.failed),
        }
    }
}

/// Serializable statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Events submitted to either entry point
    pub received: u64,
    /// Events that passed validation
    pub accepted: u64,
    /// Dropped events by reason
    pub rejected: RejectedCounts,
    /// Traversals stopped early by a processor
    pub handled: u64,
    /// Traversals that finished without error
    pub completed: u64,
    /// Traversals that ended in a processor failure
    pub failed: u64,
}

/// Dropped events by reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RejectedCounts {
    pub not_found: u64,
    pub forbidden: u64,
    pub unlinked: u64,
    pub future_timestamp: u64,
    pub stale_timestamp: u64,
    pub constraint_violation: u64,
}

impl RejectedCounts {
    pub fn total(&self) -> u64 {
        self.not_found
            + self.forbidden
            + self.unlinked
            + self.future_timestamp
            + self.stale_timestamp
            + self.constraint_violation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = ProcessingStats::new();
        stats.record_received();
        stats.record_received();
        stats.record_accepted();
        stats.record_rejected(RejectKind::StaleTimestamp);
        stats.record_completed(true);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.received, 2);
        assert_eq!(snapshot.accepted, 1);
        assert_eq!(snapshot.rejected.stale_timestamp, 1);
        assert_eq!(snapshot.rejected.total(), 1);
        assert_eq!(snapshot.handled, 1);
        assert_eq!(snapshot.completed, 1);
    }
}
