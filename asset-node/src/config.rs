//! Node configuration
//!
//! One YAML file carries the pipeline settings and the assets the node
//! starts with.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use asset_model::{Asset, AssetAttribute, AssetType};
use asset_processing::ProcessingConfig;

/// Top-level node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub node: NodeSection,
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// Assets loaded into the in-memory store at startup
    #[serde(default)]
    pub assets: Vec<AssetSeed>,
}

/// Node identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSection {
    pub name: String,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            name: "asset-node".to_string(),
        }
    }
}

/// An asset as written in the config file, attributes as a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSeed {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub asset_type: AssetType,
    #[serde(default)]
    pub attributes: Vec<AssetAttribute>,
}

impl From<AssetSeed> for Asset {
    fn from(seed: AssetSeed) -> Self {
        seed.attributes.into_iter().fold(
            Asset::new(seed.name, seed.asset_type).with_id(seed.id),
            Asset::with_attribute,
        )
    }
}

impl NodeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load from `path`, or defaults if the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Seeded assets, validated for duplicate IDs.
    pub fn assets(&self) -> anyhow::Result<Vec<Asset>> {
        let mut seen = std::collections::HashSet::new();
        self.assets
            .iter()
            .cloned()
            .map(|seed| {
                anyhow::ensure!(seen.insert(seed.id.clone()), "duplicate asset id '{}'", seed.id);
                Ok(Asset::from(seed))
            })
            .collect()
    }
}
