//! The two-click gesture that draws a new connection.
//!
//! `begin_connection` records a pending source (overwriting any earlier one),
//! `complete_connection` turns it into an edge. The pending source lives in
//! `WorkflowState::connecting_from`, so the gesture state is part of the
//! snapshot the render layer sees.

use tracing::{debug, info, warn};

use callflow_core::error::{CallflowError, Result};
use callflow_core::types::{Connection, ConnectionId, GraphEvent, NodeId};

use crate::store::GraphStore;

/// Where the connection gesture currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionGesture {
    Idle,
    PendingSource(NodeId),
}

impl GraphStore {
    pub fn gesture(&self) -> ConnectionGesture {
        match &self.state.connecting_from {
            Some(source) => ConnectionGesture::PendingSource(source.clone()),
            None => ConnectionGesture::Idle,
        }
    }

    /// Start drawing from `source`, replacing any pending source.
    pub fn begin_connection(&mut self, source: &NodeId) -> Result<()> {
        if !self.state.contains_node(source) {
            return Err(CallflowError::NodeNotFound(source.clone()));
        }
        if let Some(previous) = self.state.connecting_from.replace(source.clone()) {
            debug!(previous = %previous, source = %source, "Pending connection source replaced");
        }
        self.bus.publish(GraphEvent::ConnectionStarted {
            source: source.clone(),
        });
        Ok(())
    }

    /// Finish the gesture on `target`.
    ///
    /// Picking the source again or a missing node leaves the gesture pending.
    /// A pair that already exists is rejected and ends the gesture.
    pub fn complete_connection(&mut self, target: &NodeId) -> Result<ConnectionId> {
        let source = self
            .state
            .connecting_from
            .clone()
            .ok_or(CallflowError::NoPendingConnection)?;

        if &source == target {
            return Err(CallflowError::SelfConnection(source));
        }
        if !self.state.contains_node(target) {
            return Err(CallflowError::NodeNotFound(target.clone()));
        }

        if self.state.has_connection_between(&source, target) {
            self.state.connecting_from = None;
            warn!(source = %source, target = %target, "Duplicate connection rejected");
            self.bus.publish(GraphEvent::ConnectionRejected {
                source: source.clone(),
                target: target.clone(),
            });
            return Err(CallflowError::DuplicateConnection {
                from: source,
                to: target.clone(),
            });
        }

        let id = ConnectionId(self.fresh_id("conn", |s, id| {
            s.connections.iter().any(|c| c.id.as_str() == id)
        })?);
        self.state
            .connections
            .push(Connection::new(id.clone(), source.clone(), target.clone()));
        self.state.connecting_from = None;

        info!(connection = %id, source = %source, target = %target, "Connection created");
        self.bus.publish(GraphEvent::ConnectionAdded {
            id: id.clone(),
            source,
            target: target.clone(),
        });
        Ok(id)
    }

    /// Abandon a pending gesture. Returns `false` when nothing was pending.
    pub fn cancel_connection(&mut self) -> bool {
        match self.state.connecting_from.take() {
            Some(source) => {
                debug!(source = %source, "Connection gesture cancelled");
                self.bus.publish(GraphEvent::ConnectionCancelled { source });
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callflow_core::types::Severity;
    use callflow_core::EditorConfig;
    use callflow_test_utils::{drain_notifications, SequentialIds};

    fn store() -> GraphStore {
        GraphStore::new(&EditorConfig::default(), Box::new(SequentialIds::new()))
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn test_begin_sets_pending_and_prompts() {
        let mut store = store();
        let mut rx = store.subscribe();
        store.begin_connection(&id("response-1")).unwrap();

        assert_eq!(store.gesture(), ConnectionGesture::PendingSource(id("response-1")));
        let events = drain_notifications(&mut rx);
        assert_eq!(events[0].severity, Severity::Info);
        assert_eq!(events[0].message, "Select another node to connect to");
    }

    #[test]
    fn test_begin_overwrites_pending_source() {
        let mut store = store();
        store.begin_connection(&id("greeting-1")).unwrap();
        store.begin_connection(&id("response-1")).unwrap();
        assert_eq!(store.gesture(), ConnectionGesture::PendingSource(id("response-1")));
    }

    #[test]
    fn test_begin_on_missing_node() {
        let mut store = store();
        assert!(store.begin_connection(&id("ghost")).is_err());
        assert_eq!(store.gesture(), ConnectionGesture::Idle);
    }

    #[test]
    fn test_complete_creates_connection() {
        let mut store = store();
        let mut rx = store.subscribe();
        store.begin_connection(&id("response-1")).unwrap();
        let conn = store.complete_connection(&id("greeting-1")).unwrap();

        assert_eq!(conn, ConnectionId::from("conn-t1"));
        assert_eq!(store.state().connections.len(), 3);
        assert!(store.state().has_connection_between(&id("response-1"), &id("greeting-1")));
        assert_eq!(store.gesture(), ConnectionGesture::Idle);

        let events = drain_notifications(&mut rx);
        assert_eq!(events.last().unwrap().message, "Connection created");
        assert_eq!(events.last().unwrap().severity, Severity::Success);
    }

    #[test]
    fn test_duplicate_rejected_and_reset() {
        let mut store = store();
        let mut rx = store.subscribe();
        store.begin_connection(&id("greeting-1")).unwrap();
        let err = store.complete_connection(&id("question-1")).unwrap_err();

        assert!(matches!(err, CallflowError::DuplicateConnection { .. }));
        assert_eq!(store.state().connections.len(), 2);
        assert_eq!(store.gesture(), ConnectionGesture::Idle);

        let events = drain_notifications(&mut rx);
        let last = events.last().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert_eq!(last.message, "Connection already exists");
    }

    #[test]
    fn test_reverse_pair_is_not_a_duplicate() {
        let mut store = store();
        store.begin_connection(&id("question-1")).unwrap();
        store.complete_connection(&id("greeting-1")).unwrap();
        assert_eq!(store.state().connections.len(), 3);
    }

    #[test]
    fn test_self_connection_keeps_gesture_pending() {
        let mut store = store();
        store.begin_connection(&id("greeting-1")).unwrap();
        let err = store.complete_connection(&id("greeting-1")).unwrap_err();

        assert!(matches!(err, CallflowError::SelfConnection(_)));
        assert_eq!(store.gesture(), ConnectionGesture::PendingSource(id("greeting-1")));
        assert_eq!(store.state().connections.len(), 2);
    }

    #[test]
    fn test_complete_without_begin() {
        let mut store = store();
        assert!(matches!(
            store.complete_connection(&id("greeting-1")),
            Err(CallflowError::NoPendingConnection)
        ));
    }

    #[test]
    fn test_complete_on_missing_target_keeps_pending() {
        let mut store = store();
        store.begin_connection(&id("greeting-1")).unwrap();
        assert!(store.complete_connection(&id("ghost")).is_err());
        assert_eq!(store.gesture(), ConnectionGesture::PendingSource(id("greeting-1")));
    }

    #[test]
    fn test_cancel() {
        let mut store = store();
        assert!(!store.cancel_connection());

        let mut rx = store.subscribe();
        store.begin_connection(&id("greeting-1")).unwrap();
        assert!(store.cancel_connection());
        assert_eq!(store.gesture(), ConnectionGesture::Idle);

        let events = drain_notifications(&mut rx);
        assert_eq!(events.last().unwrap().message, "Connection cancelled");
    }
}
