//! Agent link resolution.
//!
//! An attribute is "linked" when its agent link points at an existing agent
//! asset carrying the named protocol configuration. Links are resolved for
//! every event: an agent can be reconfigured or removed between two events
//! (think of a gateway that replays a day's backlog after an outage).

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use asset_model::{Asset, AgentLink, AttributeRef};

use crate::store::AssetStore;

/// An attribute together with the live link to its owning protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedAttribute {
    /// The linked attribute
    pub attribute_ref: AttributeRef,
    /// The link as declared on the attribute
    pub link: AgentLink,
    /// Agent asset name
    pub agent_name: String,
    /// Protocol named by the configuration value, if it is a string
    pub protocol: Option<String>,
}

/// Resolves an attribute's link to an agent protocol configuration.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    /// Resolve the link of `attribute_name` on `asset`, if it is valid now.
    async fn resolve(&self, asset: &Asset, attribute_name: &str) -> Option<LinkedAttribute>;
}

/// Resolves links by loading the agent from the asset store.
pub struct StoreLinkResolver {
    store: Arc<dyn AssetStore>,
}

impl StoreLinkResolver {
    /// Create a resolver over `store`.
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LinkResolver for StoreLinkResolver {
    async fn resolve(&self, asset: &Asset, attribute_name: &str) -> Option<LinkedAttribute> {
        let link = asset.attribute(attribute_name)?.agent_link()?.clone();

        let agent = match self.store.find(&link.agent_id).await {
            Ok(Some(agent)) => agent,
            Ok(None) => {
                debug!(agent_id = %link.agent_id, "Linked agent not found");
                return None;
            }
            Err(e) => {
                warn!(agent_id = %link.agent_id, error = %e, "Failed to load linked agent");
                return None;
            }
        };

        if !agent.is_agent() {
            debug!(asset_id = %agent.id, "Link target is not an agent");
            return None;
        }

        let configuration = agent
            .attribute(&link.protocol_configuration)
            .filter(|a| a.is_protocol_configuration())?;

        Some(LinkedAttribute {
            attribute_ref: AttributeRef::new(&asset.id, attribute_name),
            protocol: configuration.value.as_str().map(String::from),
            agent_name: agent.name.clone(),
            link,
        })
    }
}
