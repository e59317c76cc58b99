//! Processor trait - one stage of the processing chain.

use async_trait::async_trait;

use crate::error::ProcessorError;
use crate::update::AssetUpdate;

/// A stage in the processing chain.
///
/// A processor may read and change the update's value and status. Setting
/// [`UpdateStatus::Handled`](crate::UpdateStatus::Handled) stops the chain
/// after this processor; returning an error (or panicking) fails the update
/// and escalates to the caller. Each processor sees an update at most once;
/// the chain never retries.
#[async_trait]
pub trait AssetUpdateProcessor: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Process one update.
    async fn process(&self, update: &mut AssetUpdate) -> Result<(), ProcessorError>;
}
