//! Asset Model - assets, attributes and attribute events
//!
//! The data types shared by every stage of the attribute event pipeline:
//!
//! - **Assets**: managed entities (things, groups, agents) owning named attributes
//! - **Attributes**: typed, timestamped values with behavioral meta flags
//! - **Constraints**: range, enum, length and presence checks applied on write
//! - **Events**: immutable, producer-timestamped proposals to change one attribute
//!
//! # Example
//!
//! ```ignore
//! use asset_model::{Asset, AssetAttribute, AssetType, AttributeEvent, ValueType};
//!
//! let asset = Asset::new("Living room", AssetType::Thing)
//!     .with_attribute(AssetAttribute::new("temperature", ValueType::Number));
//!
//! let event = AttributeEvent::new(asset.id.clone(), "temperature", json!(21.5), 1000);
//! ```

pub mod asset;
pub mod attribute;
pub mod constraint;
pub mod error;
pub mod event;
pub mod value;

// Re-export main types
pub use asset::{Asset, AssetType};
pub use attribute::{AgentLink, AssetAttribute, AttributeMeta, NEVER_UPDATED};
pub use constraint::ValueConstraint;
pub use error::ModelError;
pub use event::{AttributeEvent, AttributeRef};
pub use value::ValueType;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
