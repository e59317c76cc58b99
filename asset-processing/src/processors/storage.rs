//! Storage processor - commits attribute values to the asset store.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::trace;

use crate::error::ProcessorError;
use crate::processor::AssetUpdateProcessor;
use crate::store::AssetStore;
use crate::update::AssetUpdate;

/// Third processor in the chain: persists the value as it stands after rules.
pub struct StorageProcessor {
    store: Arc<dyn AssetStore>,
}

impl StorageProcessor {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AssetUpdateProcessor for StorageProcessor {
    fn name(&self) -> &str {
        "storage"
    }

    async fn process(&self, update: &mut AssetUpdate) -> Result<(), ProcessorError> {
        let attribute = update
            .attribute()
            .clone()
            .with_value(update.value().clone(), update.timestamp());

        self.store
            .merge_attribute(&update.asset().id, &attribute)
            .await
            .map_err(|e| ProcessorError::Storage(e.to_string()))?;

        trace!(attribute = %update.attribute_ref(), "Attribute value stored");
        Ok(())
    }
}
