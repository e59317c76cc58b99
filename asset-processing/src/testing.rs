//! Test doubles for processors.
//!
//! Configurable processors for unit and integration tests of the chain
//! and the service.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use asset_model::AttributeEvent;

use crate::error::ProcessorError;
use crate::processor::AssetUpdateProcessor;
use crate::update::{AssetUpdate, UpdateStatus};

/// Records every update it sees and lets it continue.
pub struct RecordingProcessor {
    name: String,
    call_count: AtomicUsize,
    seen: Mutex<Vec<AttributeEvent>>,
}

impl RecordingProcessor {
    /// Create a new recording processor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            call_count: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Number of times `process` was called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Updates seen so far, as events.
    pub fn seen(&self) -> Vec<AttributeEvent> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AssetUpdateProcessor for RecordingProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, update: &mut AssetUpdate) -> Result<(), ProcessorError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(update.to_event());
        }
        Ok(())
    }
}

/// Sets a fixed status on every update.
pub struct StatusProcessor {
    name: String,
    status: UpdateStatus,
    call_count: AtomicUsize,
}

impl StatusProcessor {
    /// Create a processor that sets `status`.
    pub fn new(name: impl Into<String>, status: UpdateStatus) -> Self {
        Self {
            name: name.into(),
            status,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetUpdateProcessor for StatusProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, update: &mut AssetUpdate) -> Result<(), ProcessorError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        update.set_status(self.status);
        Ok(())
    }
}

/// Fails every update, by error or by panic.
pub struct FailingProcessor {
    name: String,
    panics: bool,
}

impl FailingProcessor {
    /// Create a processor returning an error.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            panics: false,
        }
    }

    /// Create a processor that panics.
    pub fn panicking(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            panics: true,
        }
    }
}

#[async_trait]
impl AssetUpdateProcessor for FailingProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, update: &mut AssetUpdate) -> Result<(), ProcessorError> {
        if self.panics {
            panic!("{} panicked on {}", self.name, update.attribute_ref());
        }
        Err(ProcessorError::Other(format!(
            "{} failed on {}",
            self.name,
            update.attribute_ref()
        )))
    }
}
