//! AssetProcessingService - entry points into the pipeline.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use asset_model::{now_millis, Asset, AssetAttribute, AttributeEvent, AttributeRef};

use crate::chain::{ChainOutcome, ProcessingChain};
use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, RejectReason, Result};
use crate::ledger::{AttributeLedger, AttributeRecord};
use crate::link::{LinkResolver, StoreLinkResolver};
use crate::processor::AssetUpdateProcessor;
use crate::processors::{
    ActuatorSink, AgentDispatchProcessor, DatapointProcessor, DatapointStore, RulesProcessor,
    StorageProcessor,
};
use crate::stats::{ProcessingStats, StatsSnapshot};
use crate::store::AssetStore;
use crate::update::Direction;
use crate::validator::Validator;

/// Receives every attribute event, validates it and drives it through the
/// processing chain.
///
/// Rejected events are logged, counted and dropped: the caller only hears
/// about invalid operations and processor failures.
pub struct AssetProcessingService {
    config: ProcessingConfig,
    store: Arc<dyn AssetStore>,
    resolver: Arc<dyn LinkResolver>,
    ledger: Arc<AttributeLedger>,
    validator: Validator,
    chain: ProcessingChain,
    stats: ProcessingStats,
}

impl AssetProcessingService {
    /// Create a builder.
    pub fn builder() -> AssetProcessingServiceBuilder {
        AssetProcessingServiceBuilder::new()
    }

    /// Southbound entry point: a write requested by a user or a rule.
    pub async fn update_attribute_value(&self, event: AttributeEvent) -> Result<()> {
        self.stats.record_received();
        let direction = Direction::Southbound;

        let Some(asset) = self.store.find(event.entity_id()).await? else {
            return self.reject(&event, direction, RejectReason::AssetNotFound(event.entity_id().to_string()));
        };

        if asset.is_agent() {
            warn!(asset = %asset, attribute = event.attribute_name(), "Attributes of agents cannot be edited directly");
            return Err(ProcessingError::InvalidOperation(format!(
                "cannot update attribute {} of agent '{}'",
                event.attribute_ref(),
                asset.name
            )));
        }

        let Some(attribute) = asset.attribute(event.attribute_name()).cloned() else {
            return self.reject(&event, direction, RejectReason::AttributeNotFound(event.attribute_ref()));
        };

        if attribute.is_read_only() {
            return self.reject(&event, direction, RejectReason::ReadOnly(event.attribute_ref()));
        }

        self.process(asset, attribute, event, direction).await
    }

    /// Northbound entry point: a reading reported by a protocol.
    ///
    /// Read-only attributes are accepted, but the attribute must still be
    /// linked to an agent protocol configuration when the event arrives.
    pub async fn process_sensor_update(&self, event: AttributeEvent) -> Result<()> {
        self.stats.record_received();
        let direction = Direction::Northbound;

        let Some(asset) = self.store.find(event.entity_id()).await? else {
            return self.reject(&event, direction, RejectReason::AssetNotFound(event.entity_id().to_string()));
        };

        let Some(attribute) = asset.attribute(event.attribute_name()).cloned() else {
            return self.reject(&event, direction, RejectReason::AttributeNotFound(event.attribute_ref()));
        };

        if self.resolver.resolve(&asset, event.attribute_name()).await.is_none() {
            return self.reject(&event, direction, RejectReason::Unlinked(event.attribute_ref()));
        }

        self.process(asset, attribute, event, direction).await
    }

    async fn process(
        &self,
        asset: Asset,
        attribute: AssetAttribute,
        event: AttributeEvent,
        direction: Direction,
    ) -> Result<()> {
        let mut update = match self
            .validator
            .validate(asset, attribute, &event, direction, now_millis())
        {
            Ok(update) => update,
            Err(reason) => return self.reject(&event, direction, reason),
        };
        self.stats.record_accepted();

        match self.chain.process(&mut update).await {
            Ok(outcome) => {
                self.stats
                    .record_completed(matches!(outcome, ChainOutcome::Handled { .. }));
                Ok(())
            }
            Err(e) => {
                self.stats.record_failed();
                Err(e)
            }
        }
    }

    fn reject(&self, event: &AttributeEvent, direction: Direction, reason: RejectReason) -> Result<()> {
        warn!(
            event = %event,
            direction = ?direction,
            kind = ?reason.kind(),
            reason = %reason,
            "Ignoring attribute event"
        );
        self.stats.record_rejected(reason.kind());
        Ok(())
    }

    /// Spawn a task feeding sensor events from `receiver` into
    /// [`process_sensor_update`](Self::process_sensor_update).
    ///
    /// Failures are logged and the route keeps draining. The task ends once
    /// every sender has been dropped.
    pub fn spawn_sensor_route(self: Arc<Self>, mut receiver: mpsc::Receiver<AttributeEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Sensor route started");
            while let Some(event) = receiver.recv().await {
                let attribute_ref = event.attribute_ref();
                if let Err(e) = self.process_sensor_update(event).await {
                    error!(attribute = %attribute_ref, error = %e, "Sensor update failed");
                }
            }
            info!("Sensor route closed");
        })
    }

    /// Open a sensor route with the configured channel capacity.
    pub fn open_sensor_route(self: &Arc<Self>) -> (mpsc::Sender<AttributeEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.config.sensor_route.capacity.max(1));
        (tx, Arc::clone(self).spawn_sensor_route(rx))
    }

    /// Last accepted state of an attribute.
    pub fn attribute_state(&self, attribute_ref: &AttributeRef) -> Option<AttributeRecord> {
        self.ledger.get(attribute_ref)
    }

    /// Drop ordering state of a deleted asset.
    pub fn forget_asset(&self, asset_id: &str) {
        let removed = self.ledger.forget_asset(asset_id);
        debug!(asset_id = %asset_id, removed, "Forgot attribute state of asset");
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    pub fn chain(&self) -> &ProcessingChain {
        &self.chain
    }

    pub fn ledger(&self) -> &Arc<AttributeLedger> {
        &self.ledger
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

struct StandardChain {
    rules: Arc<RulesProcessor>,
    actuator: Arc<dyn ActuatorSink>,
    datapoints: Arc<dyn DatapointStore>,
}

/// Builder for [`AssetProcessingService`].
pub struct AssetProcessingServiceBuilder {
    config: ProcessingConfig,
    store: Option<Arc<dyn AssetStore>>,
    resolver: Option<Arc<dyn LinkResolver>>,
    standard: Option<StandardChain>,
    processors: Vec<Arc<dyn AssetUpdateProcessor>>,
}

impl AssetProcessingServiceBuilder {
    pub fn new() -> Self {
        Self {
            config: ProcessingConfig::default(),
            store: None,
            resolver: None,
            standard: None,
            processors: Vec::new(),
        }
    }

    pub fn config(mut self, config: ProcessingConfig) -> Self {
        self.config = config;
        self
    }

    /// Asset store (required).
    pub fn store(mut self, store: Arc<dyn AssetStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Link resolver. Defaults to resolving through the asset store.
    pub fn resolver(mut self, resolver: Arc<dyn LinkResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Use rules, agent dispatch, storage and datapoints as the chain.
    pub fn with_standard_chain(
        mut self,
        rules: Arc<RulesProcessor>,
        actuator: Arc<dyn ActuatorSink>,
        datapoints: Arc<dyn DatapointStore>,
    ) -> Self {
        self.standard = Some(StandardChain {
            rules,
            actuator,
            datapoints,
        });
        self
    }

    /// Append a processor; runs after the standard chain if there is one.
    pub fn processor(mut self, processor: Arc<dyn AssetUpdateProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn build(self) -> Result<AssetProcessingService> {
        let store = self
            .store
            .ok_or_else(|| ProcessingError::ConfigError("asset store is required".to_string()))?;
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(StoreLinkResolver::new(store.clone())));

        let mut chain = ProcessingChain::builder();
        if let Some(standard) = self.standard {
            let datapoints = &self.config.datapoints;
            chain = chain
                .processor(standard.rules)
                .processor(Arc::new(AgentDispatchProcessor::new(
                    resolver.clone(),
                    standard.actuator,
                )))
                .processor(Arc::new(StorageProcessor::new(store.clone())))
                .processor(Arc::new(
                    DatapointProcessor::new(standard.datapoints)
                        .with_enabled(datapoints.enabled)
                        .with_northbound_only(datapoints.northbound_only),
                ));
        }
        for processor in self.processors {
            chain = chain.processor(processor);
        }
        let chain = chain.build();

        let ledger = Arc::new(AttributeLedger::new());
        let validator = Validator::new(&self.config.validation, ledger.clone());

        info!(
            processors = ?chain.processor_names(),
            future_tolerance_ms = validator.future_tolerance_ms(),
            "Asset processing service ready"
        );

        Ok(AssetProcessingService {
            config: self.config,
            store,
            resolver,
            ledger,
            validator,
            chain,
            stats: ProcessingStats::new(),
        })
    }
}

impl Default for AssetProcessingServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
