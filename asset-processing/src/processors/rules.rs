//! Rules processor - offers updates to rule sessions.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use asset_model::{Asset, AttributeEvent, AttributeRef};

use crate::error::ProcessorError;
use crate::processor::AssetUpdateProcessor;
use crate::update::{AssetUpdate, UpdateStatus};

/// A rules engine session.
///
/// How rules are written and evaluated is up to the session. A session may
/// rewrite the update's value, set [`UpdateStatus::RulesHandled`] to keep
/// later sessions from seeing it, or set [`UpdateStatus::Handled`] to stop
/// the whole chain.
#[async_trait]
pub trait RulesSession: Send + Sync {
    /// Session ID.
    fn id(&self) -> &str;

    /// Whether this session's rules apply to `asset`.
    fn in_scope(&self, _asset: &Asset) -> bool {
        true
    }

    /// Evaluate the update.
    async fn evaluate(&self, update: &mut AssetUpdate) -> Result<(), ProcessorError>;
}

/// First processor in the chain: rule evaluation.
///
/// Only attributes flagged as rules facts or rules events are offered to
/// sessions. The latest value of every rules-fact attribute is kept as the
/// current fact.
pub struct RulesProcessor {
    sessions: RwLock<Vec<Arc<dyn RulesSession>>>,
    facts: DashMap<AttributeRef, AttributeEvent>,
}

impl RulesProcessor {
    /// Create a processor with no sessions.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(Vec::new()),
            facts: DashMap::new(),
        }
    }

    /// Register a session; sessions are consulted in registration order.
    pub async fn register_session(&self, session: Arc<dyn RulesSession>) {
        info!(session_id = session.id(), "Registering rules session");
        self.sessions.write().await.push(session);
    }

    /// Remove a session by ID. Returns `true` if found.
    pub async fn unregister_session(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| s.id() != id);
        sessions.len() < before
    }

    /// Number of registered sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Current fact for an attribute.
    pub fn fact(&self, attribute_ref: &AttributeRef) -> Option<AttributeEvent> {
        self.facts.get(attribute_ref).map(|f| f.value().clone())
    }

    /// Number of facts held.
    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }
}

impl Default for RulesProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetUpdateProcessor for RulesProcessor {
    fn name(&self) -> &str {
        "rules"
    }

    async fn process(&self, update: &mut AssetUpdate) -> Result<(), ProcessorError> {
        let attribute = update.attribute();
        if !attribute.is_rules_fact() && !attribute.is_rules_event() {
            return Ok(());
        }
        let is_fact = attribute.is_rules_fact();

        let sessions: Vec<_> = self.sessions.read().await.iter().cloned().collect();
        for session in sessions {
            if !session.in_scope(update.asset()) {
                continue;
            }
            debug!(session_id = session.id(), update_id = %update.id(), "Rules session evaluating update");
            session.evaluate(update).await?;

            if matches!(
                update.status(),
                UpdateStatus::RulesHandled | UpdateStatus::Handled
            ) {
                debug!(session_id = session.id(), status = ?update.status(), "Rules session handled update");
                break;
            }
        }

        if is_fact {
            self.facts.insert(update.attribute_ref(), update.to_event());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AttributeRecord;
    use crate::update::Direction;
    use asset_model::{AssetAttribute, AssetType, ValueType};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Clamps numbers to a maximum and optionally claims the update.
    struct ClampSession {
        id: String,
        max: f64,
        claim: Option<UpdateStatus>,
        calls: AtomicUsize,
    }

    impl ClampSession {
        fn new(id: &str, max: f64, claim: Option<UpdateStatus>) -> Self {
            Self {
                id: id.to_string(),
                max,
                claim,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RulesSession for ClampSession {
        fn id(&self) -> &str {
            &self.id
        }

        async fn evaluate(&self, update: &mut AssetUpdate) -> Result<(), ProcessorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(v) = update.value().as_f64() {
                if v > self.max {
                    update.set_value(json!(self.max));
                }
            }
            if let Some(status) = self.claim {
                update.set_status(status);
            }
            Ok(())
        }
    }

    fn update(attribute: AssetAttribute) -> AssetUpdate {
        let attribute = attribute.with_value(json!(35.0), 1000);
        let asset = Asset::new("Room", AssetType::Thing)
            .with_id("room")
            .with_attribute(attribute.clone());
        AssetUpdate::new(asset, attribute, AttributeRecord::default(), Direction::Southbound)
    }

    #[tokio::test]
    async fn test_ignores_attributes_outside_rules() {
        let processor = RulesProcessor::new();
        let session = Arc::new(ClampSession::new("clamp", 30.0, None));
        processor.register_session(session.clone()).await;

        let mut update = update(AssetAttribute::new("setpoint", ValueType::Number));
        processor.process(&mut update).await.unwrap();

        assert_eq!(session.calls.load(Ordering::SeqCst), 0);
        assert_eq!(update.value(), &json!(35.0));
    }

    #[tokio::test]
    async fn test_rule_rewrites_value_and_fact() {
        let processor = RulesProcessor::new();
        processor
            .register_session(Arc::new(ClampSession::new("clamp", 30.0, None)))
            .await;

        let mut update = update(AssetAttribute::new("setpoint", ValueType::Number).with_rules_fact(true));
        processor.process(&mut update).await.unwrap();

        assert_eq!(update.value(), &json!(30.0));
        let fact = processor.fact(&AttributeRef::new("room", "setpoint")).unwrap();
        assert_eq!(fact.value(), &json!(30.0));
    }

    #[tokio::test]
    async fn test_rules_handled_stops_later_sessions() {
        let processor = RulesProcessor::new();
        let first = Arc::new(ClampSession::new("first", 100.0, Some(UpdateStatus::RulesHandled)));
        let second = Arc::new(ClampSession::new("second", 100.0, None));
        processor.register_session(first.clone()).await;
        processor.register_session(second.clone()).await;

        let mut update = update(AssetAttribute::new("setpoint", ValueType::Number).with_rules_event(true));
        processor.process(&mut update).await.unwrap();

        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
        assert_eq!(update.status(), UpdateStatus::RulesHandled);
        assert_eq!(processor.fact_count(), 0);
    }

    #[tokio::test]
    async fn test_unregister_session() {
        let processor = RulesProcessor::new();
        processor
            .register_session(Arc::new(ClampSession::new("clamp", 1.0, None)))
            .await;
        assert!(processor.unregister_session("clamp").await);
        assert!(!processor.unregister_session("clamp").await);
        assert_eq!(processor.session_count().await, 0);
    }
}
