//! Processing chain - ordered processors with short-circuit and escalation.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::{ProcessingError, ProcessorError, Result};
use crate::processor::AssetUpdateProcessor;
use crate::update::{AssetUpdate, UpdateStatus};

/// How a traversal ended when no processor failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Every processor saw the update
    Completed,
    /// A processor handled the update and the rest were skipped
    Handled { by: String },
}

/// A fixed, ordered list of processors.
///
/// Built once at startup; the order never changes afterwards.
pub struct ProcessingChain {
    processors: Vec<Arc<dyn AssetUpdateProcessor>>,
}

impl ProcessingChain {
    /// Create a chain from processors in invocation order.
    pub fn new(processors: Vec<Arc<dyn AssetUpdateProcessor>>) -> Self {
        Self { processors }
    }

    /// Create a builder.
    pub fn builder() -> ProcessingChainBuilder {
        ProcessingChainBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Processor names in invocation order.
    pub fn processor_names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Drive one update through the chain.
    ///
    /// The update always ends `Completed`. A failed processor stops the
    /// traversal and is reported as [`ProcessingError::ConsumerFailure`];
    /// side effects of earlier processors stay in place.
    pub async fn process(&self, update: &mut AssetUpdate) -> Result<ChainOutcome> {
        debug!(update = %update, ">>> Processing start");
        update.begin();

        let mut outcome = ChainOutcome::Completed;
        for processor in &self.processors {
            debug!(processor = processor.name(), update_id = %update.id(), "Processor accepts update");

            let result = AssertUnwindSafe(processor.process(update))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(ProcessorError::Panicked(panic_message(panic))));

            if let Err(e) = result {
                error!(
                    processor = processor.name(),
                    update = %update,
                    error = %e,
                    "Processor failed whilst processing the update"
                );
                update.fail(e);
            }

            if !update.status().stops_chain() {
                continue;
            }

            if update.status() == UpdateStatus::Handled {
                debug!(processor = processor.name(), update_id = %update.id(), "Processor finally handled update");
                outcome = ChainOutcome::Handled {
                    by: processor.name().to_string(),
                };
                break;
            }

            error!(update_id = %update.id(), "Update status is ERROR, cannot continue processing");
            update.complete();
            let source = update.take_error().unwrap_or_else(|| {
                ProcessorError::Other("status set to ERROR without a cause".to_string())
            });
            debug!(update = %update, "<<< Processing complete");
            return Err(ProcessingError::ConsumerFailure {
                processor: processor.name().to_string(),
                attribute_ref: update.attribute_ref(),
                asset_name: update.asset().name.clone(),
                source,
            });
        }

        update.complete();
        debug!(update = %update, "<<< Processing complete");
        Ok(outcome)
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Builder for a processing chain.
pub struct ProcessingChainBuilder {
    processors: Vec<Arc<dyn AssetUpdateProcessor>>,
}

impl ProcessingChainBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Append a processor.
    pub fn processor(mut self, processor: Arc<dyn AssetUpdateProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// Build the chain.
    pub fn build(self) -> ProcessingChain {
        ProcessingChain::new(self.processors)
    }
}

impl Default for ProcessingChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AttributeRecord;
    use crate::testing::{FailingProcessor, RecordingProcessor, StatusProcessor};
    use crate::update::Direction;
    use asset_model::{Asset, AssetAttribute, AssetType, ValueType};
    use serde_json::json;

    fn update() -> AssetUpdate {
        let attribute = AssetAttribute::new("temperature", ValueType::Number).with_value(json!(21.5), 1000);
        let asset = Asset::new("Room", AssetType::Thing)
            .with_id("room")
            .with_attribute(attribute.clone());
        AssetUpdate::new(asset, attribute, AttributeRecord::default(), Direction::Northbound)
    }

    #[tokio::test]
    async fn test_all_processors_invoked_in_order() {
        let a = Arc::new(RecordingProcessor::new("a"));
        let b = Arc::new(RecordingProcessor::new("b"));
        let chain = ProcessingChain::builder()
            .processor(a.clone())
            .processor(b.clone())
            .build();

        let mut update = update();
        let outcome = chain.process(&mut update).await.unwrap();

        assert_eq!(outcome, ChainOutcome::Completed);
        assert_eq!(update.status(), UpdateStatus::Completed);
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
        assert_eq!(chain.processor_names(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_handled_short_circuits() {
        let b = Arc::new(RecordingProcessor::new("b"));
        let c = Arc::new(RecordingProcessor::new("c"));
        let chain = ProcessingChain::new(vec![
            Arc::new(StatusProcessor::new("a", UpdateStatus::Handled)),
            b.clone(),
            c.clone(),
        ]);

        let mut update = update();
        let outcome = chain.process(&mut update).await.unwrap();

        assert_eq!(outcome, ChainOutcome::Handled { by: "a".into() });
        assert_eq!(update.status(), UpdateStatus::Completed);
        assert_eq!(b.call_count(), 0);
        assert_eq!(c.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rules_handled_continues() {
        let b = Arc::new(RecordingProcessor::new("b"));
        let chain = ProcessingChain::new(vec![
            Arc::new(StatusProcessor::new("a", UpdateStatus::RulesHandled)),
            b.clone(),
        ]);

        let mut update = update();
        assert_eq!(chain.process(&mut update).await.unwrap(), ChainOutcome::Completed);
        assert_eq!(b.call_count(), 1);
    }

    #[tokio::test]
    async fn test_error_escalates_and_stops() {
        let a = Arc::new(RecordingProcessor::new("a"));
        let c = Arc::new(RecordingProcessor::new("c"));
        let chain = ProcessingChain::new(vec![a.clone(), Arc::new(FailingProcessor::new("b")), c.clone()]);

        let mut update = update();
        let err = chain.process(&mut update).await.unwrap_err();

        assert_eq!(err.processor(), Some("b"));
        assert_eq!(update.status(), UpdateStatus::Completed);
        assert_eq!(a.call_count(), 1);
        assert_eq!(c.call_count(), 0);
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        let c = Arc::new(RecordingProcessor::new("c"));
        let chain = ProcessingChain::new(vec![Arc::new(FailingProcessor::panicking("b")), c.clone()]);

        let mut update = update();
        let err = chain.process(&mut update).await.unwrap_err();

        match err {
            ProcessingError::ConsumerFailure { processor, source, .. } => {
                assert_eq!(processor, "b");
                assert!(matches!(source, ProcessorError::Panicked(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(c.call_count(), 0);
    }

    #[tokio::test]
    async fn test_error_status_without_cause() {
        let chain = ProcessingChain::new(vec![Arc::new(StatusProcessor::new("a", UpdateStatus::Error))]);

        let mut update = update();
        let err = chain.process(&mut update).await.unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::ConsumerFailure {
                source: ProcessorError::Other(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_chain_completes() {
        let chain = ProcessingChain::builder().build();
        let mut update = update();
        assert!(chain.is_empty());
        assert_eq!(chain.process(&mut update).await.unwrap(), ChainOutcome::Completed);
        assert_eq!(update.status(), UpdateStatus::Completed);
    }
}
