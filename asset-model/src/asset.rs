//! Assets - managed entities owning named attributes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::attribute::AssetAttribute;

/// Well-known asset types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// A device or service with attributes
    #[default]
    Thing,
    /// A protocol adapter other assets' attributes link to
    Agent,
    /// A grouping of other assets
    Group,
}

/// A managed entity with named attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique asset ID
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Asset type
    #[serde(default)]
    pub asset_type: AssetType,
    /// Attributes by name
    #[serde(default)]
    pub attributes: BTreeMap<String, AssetAttribute>,
}

impl Asset {
    /// Create a new asset with a generated ID.
    pub fn new(name: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            asset_type,
            attributes: BTreeMap::new(),
        }
    }

    /// Use a fixed ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Add (or replace) an attribute.
    pub fn with_attribute(mut self, attribute: AssetAttribute) -> Self {
        self.attributes.insert(attribute.name.clone(), attribute);
        self
    }

    /// Whether this asset is an agent.
    pub fn is_agent(&self) -> bool {
        self.asset_type == AssetType::Agent
    }

    /// Get an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AssetAttribute> {
        self.attributes.get(name)
    }

    /// Get a mutable attribute by name.
    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut AssetAttribute> {
        self.attributes.get_mut(name)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset{{id={}, name={}, type={:?}}}", self.id, self.name, self.asset_type)
    }
}
