//! Asset Processing - the attribute event pipeline
//!
//! Every attribute value change in the system enters here, whether it comes
//! from a protocol (sensor reading), a rule, or a user:
//!
//! - **Entry points**: southbound (user/rule) and northbound (protocol) ingress
//! - **Validator**: freshness, ordering and constraint checks, then the write
//! - **Processing chain**: a fixed, ordered list of processors
//! - **Standard processors**: rules, agent dispatch, storage, datapoints
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   AssetProcessingService                        │
//! │                                                                 │
//! │  update_attribute_value ─┐                                      │
//! │  process_sensor_update ──┴──▶ Validator ──▶ AssetUpdate         │
//! │                                                 │               │
//! │  ┌───────┐  ┌───────┐  ┌─────────┐  ┌────────────▼──┐           │
//! │  │ Rules │──│ Agent │──│ Storage │──│  Datapoints   │           │
//! │  └───────┘  └───────┘  └─────────┘  └───────────────┘           │
//! │          HANDLED stops the chain, ERROR escalates               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod ledger;
pub mod link;
pub mod processor;
pub mod processors;
pub mod service;
pub mod stats;
pub mod store;
pub mod testing;
pub mod update;
pub mod validator;

// Re-export main types
pub use chain::{ChainOutcome, ProcessingChain, ProcessingChainBuilder};
pub use config::ProcessingConfig;
pub use error::{ProcessingError, ProcessorError, RejectKind, RejectReason, Result};
pub use ledger::{AttributeLedger, AttributeRecord};
pub use link::{LinkResolver, LinkedAttribute, StoreLinkResolver};
pub use processor::AssetUpdateProcessor;
pub use service::{AssetProcessingService, AssetProcessingServiceBuilder};
pub use stats::{ProcessingStats, StatsSnapshot};
pub use store::{AssetStore, MemoryAssetStore, StoreError};
pub use update::{AssetUpdate, Direction, UpdateStatus};
pub use validator::Validator;
