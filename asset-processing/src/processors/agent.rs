//! Agent dispatch - hands southbound writes of linked attributes to their protocol.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use asset_model::AttributeEvent;

use crate::error::ProcessorError;
use crate::link::{LinkResolver, LinkedAttribute};
use crate::processor::AssetUpdateProcessor;
use crate::update::{AssetUpdate, UpdateStatus};

/// A write destined for a device.
#[derive(Debug, Clone)]
pub struct ActuatorCommand {
    /// The value to write
    pub event: AttributeEvent,
    /// Where it goes
    pub link: LinkedAttribute,
}

/// Receives actuator commands on behalf of the protocols.
#[async_trait]
pub trait ActuatorSink: Send + Sync {
    async fn send(&self, command: ActuatorCommand) -> Result<(), ProcessorError>;
}

/// Actuator sink over a bounded channel.
pub struct ChannelActuatorSink {
    sender: mpsc::Sender<ActuatorCommand>,
}

impl ChannelActuatorSink {
    pub fn new(sender: mpsc::Sender<ActuatorCommand>) -> Self {
        Self { sender }
    }

    /// Create a sink and the receiving end protocols read from.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ActuatorCommand>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ActuatorSink for ChannelActuatorSink {
    async fn send(&self, command: ActuatorCommand) -> Result<(), ProcessorError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| ProcessorError::Dispatch("actuator channel closed".to_string()))
    }
}

/// Second processor in the chain.
///
/// Sensor updates and unlinked attributes pass through untouched. A
/// southbound write to an attribute that declares a link is sent to the
/// actuator and the update is marked handled: the protocol reports the
/// device's new state back as a sensor update. A declared link that does
/// not resolve is an error.
pub struct AgentDispatchProcessor {
    resolver: Arc<dyn LinkResolver>,
    actuator: Arc<dyn ActuatorSink>,
}

impl AgentDispatchProcessor {
    pub fn new(resolver: Arc<dyn LinkResolver>, actuator: Arc<dyn ActuatorSink>) -> Self {
        Self { resolver, actuator }
    }
}

#[async_trait]
impl AssetUpdateProcessor for AgentDispatchProcessor {
    fn name(&self) -> &str {
        "agent"
    }

    async fn process(&self, update: &mut AssetUpdate) -> Result<(), ProcessorError> {
        if update.is_northbound() {
            return Ok(());
        }
        let Some(declared) = update.attribute().agent_link() else {
            return Ok(());
        };

        let link = match self
            .resolver
            .resolve(update.asset(), &update.attribute().name)
            .await
        {
            Some(link) => link,
            None => {
                return Err(ProcessorError::Dispatch(format!(
                    "invalid agent link {}:{} on {}",
                    declared.agent_id,
                    declared.protocol_configuration,
                    update.attribute_ref()
                )));
            }
        };

        debug!(
            update_id = %update.id(),
            agent = %link.agent_name,
            protocol = ?link.protocol,
            "Dispatching write to protocol"
        );
        self.actuator
            .send(ActuatorCommand {
                event: update.to_event(),
                link,
            })
            .await?;

        info!(attribute = %update.attribute_ref(), "Write handed to protocol");
        update.set_status(UpdateStatus::Handled);
        Ok(())
    }
}
