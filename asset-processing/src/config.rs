//! Configuration for the processing pipeline.

use serde::{Deserialize, Serialize};

/// Configuration for an asset processing service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Datapoint recording configuration
    #[serde(default)]
    pub datapoints: DatapointConfig,
    /// Sensor route configuration
    #[serde(default)]
    pub sensor_route: ChannelConfig,
    /// Actuator channel configuration
    #[serde(default)]
    pub actuator: ChannelConfig,
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
}

impl ProcessingConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// How far ahead of the local clock an event may be stamped (ms)
    pub future_tolerance_ms: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            future_tolerance_ms: 1000,
        }
    }
}

/// Datapoint recording configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatapointConfig {
    /// Record datapoints at all
    pub enabled: bool,
    /// Only record sensor (northbound) updates
    pub northbound_only: bool,
    /// Datapoints kept per attribute by the in-memory store
    pub max_per_attribute: usize,
}

impl Default for DatapointConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            northbound_only: false,
            max_per_attribute: 10_000,
        }
    }
}

/// Bounded channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel capacity
    pub capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

/// General configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
