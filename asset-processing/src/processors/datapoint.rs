//! Datapoint processor - time-series history of attribute values.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

use asset_model::AttributeRef;

use crate::error::ProcessorError;
use crate::processor::AssetUpdateProcessor;
use crate::store::StoreError;
use crate::update::AssetUpdate;

/// One recorded value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    pub attribute_ref: AttributeRef,
    pub value: Value,
    pub timestamp: i64,
}

/// Where datapoints are recorded.
#[async_trait]
pub trait DatapointStore: Send + Sync {
    async fn record(&self, datapoint: Datapoint) -> Result<(), StoreError>;
}

/// Bounded in-memory datapoint store.
///
/// Keeps the most recent `max_per_attribute` datapoints per attribute in
/// arrival order; the oldest are evicted first.
pub struct MemoryDatapointStore {
    series: DashMap<AttributeRef, VecDeque<Datapoint>>,
    max_per_attribute: usize,
}

impl MemoryDatapointStore {
    pub fn new(max_per_attribute: usize) -> Self {
        Self {
            series: DashMap::new(),
            max_per_attribute: max_per_attribute.max(1),
        }
    }

    /// Recorded datapoints for an attribute, oldest first.
    pub fn datapoints(&self, attribute_ref: &AttributeRef) -> Vec<Datapoint> {
        self.series
            .get(attribute_ref)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Total datapoints held.
    pub fn len(&self) -> usize {
        self.series.iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DatapointStore for MemoryDatapointStore {
    async fn record(&self, datapoint: Datapoint) -> Result<(), StoreError> {
        let mut series = self
            .series
            .entry(datapoint.attribute_ref.clone())
            .or_default();
        if series.len() >= self.max_per_attribute {
            series.pop_front();
        }
        series.push_back(datapoint);
        Ok(())
    }
}

/// Last processor in the chain.
///
/// Records a datapoint for attributes flagged to store datapoints. With
/// `northbound_only`, user and rule writes are left out of the history.
pub struct DatapointProcessor {
    store: Arc<dyn DatapointStore>,
    enabled: bool,
    northbound_only: bool,
}

impl DatapointProcessor {
    pub fn new(store: Arc<dyn DatapointStore>) -> Self {
        Self {
            store,
            enabled: true,
            northbound_only: false,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_northbound_only(mut self, northbound_only: bool) -> Self {
        self.northbound_only = northbound_only;
        self
    }
}

#[async_trait]
impl AssetUpdateProcessor for DatapointProcessor {
    fn name(&self) -> &str {
        "datapoints"
    }

    async fn process(&self, update: &mut AssetUpdate) -> Result<(), ProcessorError> {
        if !self.enabled || !update.attribute().is_storing_datapoints() {
            return Ok(());
        }
        if self.northbound_only && !update.is_northbound() {
            return Ok(());
        }

        let datapoint = Datapoint {
            attribute_ref: update.attribute_ref(),
            value: update.value().clone(),
            timestamp: update.timestamp(),
        };
        self.store
            .record(datapoint)
            .await
            .map_err(|e| ProcessorError::Datapoint(e.to_string()))?;

        trace!(attribute = %update.attribute_ref(), timestamp = update.timestamp(), "Datapoint recorded");
        Ok(())
    }
}
