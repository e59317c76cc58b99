//! Asset store - lookup and persistence collaborator.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use asset_model::{Asset, AssetAttribute, AttributeRef};

/// Error types for asset store operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Asset does not exist
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Attribute does not exist on the asset
    #[error("Attribute not found: {0}")]
    AttributeNotFound(AttributeRef),

    /// Store cannot serve requests
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Where assets are loaded from and attribute values committed to.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Load an asset with its attributes.
    async fn find(&self, asset_id: &str) -> Result<Option<Asset>, StoreError>;

    /// Persist one attribute's value and timestamp.
    async fn merge_attribute(
        &self,
        asset_id: &str,
        attribute: &AssetAttribute,
    ) -> Result<(), StoreError>;
}

/// In-memory asset store.
///
/// An attribute is never overwritten by an older timestamp, so commits
/// arriving out of order from concurrent traversals cannot roll a value back.
pub struct MemoryAssetStore {
    assets: DashMap<String, Asset>,
    available: AtomicBool,
}

impl MemoryAssetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            assets: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Create a store holding `assets`.
    pub fn with_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        let store = Self::new();
        for asset in assets {
            store.insert(asset);
        }
        store
    }

    /// Insert or replace an asset.
    pub fn insert(&self, asset: Asset) {
        self.assets.insert(asset.id.clone(), asset);
    }

    /// Remove an asset.
    pub fn remove(&self, asset_id: &str) -> Option<Asset> {
        self.assets.remove(asset_id).map(|(_, asset)| asset)
    }

    /// Current copy of an asset.
    pub fn get(&self, asset_id: &str) -> Option<Asset> {
        self.assets.get(asset_id).map(|a| a.value().clone())
    }

    /// Current copy of an attribute.
    pub fn attribute(&self, attribute_ref: &AttributeRef) -> Option<AssetAttribute> {
        self.assets
            .get(&attribute_ref.entity_id)
            .and_then(|a| a.attribute(&attribute_ref.attribute_name).cloned())
    }

    /// Simulate an outage.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store disabled".to_string()))
        }
    }
}

impl Default for MemoryAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn find(&self, asset_id: &str) -> Result<Option<Asset>, StoreError> {
        self.check_available()?;
        Ok(self.get(asset_id))
    }

    async fn merge_attribute(
        &self,
        asset_id: &str,
        attribute: &AssetAttribute,
    ) -> Result<(), StoreError> {
        self.check_available()?;

        let mut asset = self
            .assets
            .get_mut(asset_id)
            .ok_or_else(|| StoreError::AssetNotFound(asset_id.to_string()))?;
        let stored = asset
            .attribute_mut(&attribute.name)
            .ok_or_else(|| StoreError::AttributeNotFound(AttributeRef::new(asset_id, &attribute.name)))?;

        if stored.timestamp > attribute.timestamp {
            debug!(
                asset_id = %asset_id,
                attribute = %attribute.name,
                stored_timestamp = stored.timestamp,
                timestamp = attribute.timestamp,
                "Skipping merge of older attribute value"
            );
            return Ok(());
        }

        stored.value = attribute.value.clone();
        stored.timestamp = attribute.timestamp;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_model::{AssetType, ValueType};
    use serde_json::json;

    fn store() -> MemoryAssetStore {
        MemoryAssetStore::with_assets([Asset::new("Room", AssetType::Thing)
            .with_id("room")
            .with_attribute(AssetAttribute::new("temperature", ValueType::Number))])
    }

    #[tokio::test]
    async fn test_find() {
        let store = store();
        assert!(store.find("room").await.unwrap().is_some());
        assert!(store.find("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merge_never_goes_back_in_time() {
        let store = store();
        let attribute_ref = AttributeRef::new("room", "temperature");
        let newer = AssetAttribute::new("temperature", ValueType::Number).with_value(json!(22), 2000);
        let older = AssetAttribute::new("temperature", ValueType::Number).with_value(json!(21), 1000);

        store.merge_attribute("room", &newer).await.unwrap();
        store.merge_attribute("room", &older).await.unwrap();

        let stored = store.attribute(&attribute_ref).unwrap();
        assert_eq!(stored.value, json!(22));
        assert_eq!(stored.timestamp, 2000);
    }

    #[tokio::test]
    async fn test_merge_unknown_attribute() {
        let store = store();
        let attribute = AssetAttribute::new("humidity", ValueType::Number).with_value(json!(40), 1);
        let err = store.merge_attribute("room", &attribute).await.unwrap_err();
        assert!(matches!(err, StoreError::AttributeNotFound(_)));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = store();
        store.set_available(false);
        assert!(matches!(
            store.find("room").await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
