//! asset-node: runs the attribute event pipeline over an in-memory store
//!
//! Assets are seeded from the config file. Sensor readings and writes are
//! replayed from a JSON-lines file; actuator commands are logged.

pub mod config;
pub mod replay;
