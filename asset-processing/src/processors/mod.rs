//! Standard processors, in chain order:
//!
//! 1. **Rules**: offers the update to rule sessions in scope
//! 2. **Agent**: dispatches southbound writes to the owning protocol
//! 3. **Storage**: persists the attribute value
//! 4. **Datapoints**: records time-series datapoints

mod agent;
mod datapoint;
mod rules;
mod storage;

pub use agent::{ActuatorCommand, ActuatorSink, AgentDispatchProcessor, ChannelActuatorSink};
pub use datapoint::{Datapoint, DatapointProcessor, DatapointStore, MemoryDatapointStore};
pub use rules::{RulesProcessor, RulesSession};
pub use storage::StorageProcessor;
