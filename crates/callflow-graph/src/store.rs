use tokio::sync::broadcast::Receiver;
use tracing::{debug, info};

use callflow_core::config::{CanvasConfig, EditorConfig};
use callflow_core::error::{CallflowError, Result};
use callflow_core::types::{
    ConnectionId, GraphEvent, Node, NodeId, NodeKind, Notification, Position, WorkflowState,
};
use callflow_core::{EventBus, IdGenerator, UuidIds};

use crate::seed::demo_workflow;

/// Attempts at drawing an unused id before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

/// Sole owner of the workflow being edited.
///
/// Every mutation runs to completion on `&mut self`; render layers read
/// `state()` or take a `snapshot()` afterwards.
pub struct GraphStore {
    pub(crate) state: WorkflowState,
    pub(crate) bus: EventBus,
    ids: Box<dyn IdGenerator>,
    canvas: CanvasConfig,
}

impl GraphStore {
    /// A store configured by `config`, seeded with the demo script when enabled.
    pub fn new(config: &EditorConfig, ids: Box<dyn IdGenerator>) -> Self {
        let state = if config.session.seed_demo {
            demo_workflow()
        } else {
            WorkflowState::new()
        };
        Self {
            state,
            bus: EventBus::new(config.session.event_capacity),
            ids,
            canvas: config.canvas.clone(),
        }
    }

    /// Adopt an externally built workflow after checking its invariants.
    pub fn from_state(
        state: WorkflowState,
        config: &EditorConfig,
        ids: Box<dyn IdGenerator>,
    ) -> Result<Self> {
        state.validate()?;
        Ok(Self {
            state,
            bus: EventBus::new(config.session.event_capacity),
            ids,
            canvas: config.canvas.clone(),
        })
    }

    /// Default configuration, demo seed and uuid ids.
    pub fn demo() -> Self {
        Self::new(&EditorConfig::default(), Box::new(UuidIds))
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Owned copy of the current state for a render pass.
    pub fn snapshot(&self) -> WorkflowState {
        self.state.clone()
    }

    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    /// Receive every notification published from now on.
    pub fn subscribe(&self) -> Receiver<Notification> {
        self.bus.subscribe()
    }

    /// Add a node at the configured spawn point.
    pub fn add_node(&mut self, kind: NodeKind) -> Result<NodeId> {
        let position = self.canvas.spawn_position();
        self.add_node_at(kind, position)
    }

    /// Add a node of `kind` with its default text and select it.
    pub fn add_node_at(&mut self, kind: NodeKind, position: Position) -> Result<NodeId> {
        let id = NodeId(self.fresh_id(kind.as_str(), |s, id| {
            s.nodes.iter().any(|n| n.id.as_str() == id)
        })?);

        self.state.nodes.push(Node::new(id.clone(), kind, position));
        self.state.selected_node = Some(id.clone());

        info!(node = %id, kind = %kind, "Node added");
        self.bus.publish(GraphEvent::NodeAdded {
            id: id.clone(),
            kind,
        });
        Ok(id)
    }

    /// Remove a node together with every connection touching it.
    pub fn delete_node(&mut self, id: &NodeId) -> Result<()> {
        let index = self
            .state
            .nodes
            .iter()
            .position(|n| &n.id == id)
            .ok_or_else(|| CallflowError::NodeNotFound(id.clone()))?;

        self.state.nodes.remove(index);
        let before = self.state.connections.len();
        self.state.connections.retain(|c| !c.touches(id));
        let removed_connections = before - self.state.connections.len();

        if self.state.selected_node.as_ref() == Some(id) {
            self.state.selected_node = None;
        }
        // A pending gesture must not start from a node that no longer exists.
        if self.state.connecting_from.as_ref() == Some(id) {
            self.state.connecting_from = None;
        }

        info!(node = %id, removed_connections, "Node deleted");
        self.bus.publish(GraphEvent::NodeDeleted {
            id: id.clone(),
            removed_connections,
        });
        Ok(())
    }

    pub fn update_title(&mut self, id: &NodeId, text: impl Into<String>) -> Result<()> {
        self.node_mut(id)?.title = text.into();
        Ok(())
    }

    pub fn update_content(&mut self, id: &NodeId, text: impl Into<String>) -> Result<()> {
        self.node_mut(id)?.content = text.into();
        Ok(())
    }

    /// Move a node. Any coordinates are accepted.
    pub fn set_position(&mut self, id: &NodeId, position: Position) -> Result<()> {
        self.node_mut(id)?.position = position;
        Ok(())
    }

    pub fn set_color(&mut self, id: &NodeId, color: Option<String>) -> Result<()> {
        self.node_mut(id)?.color = color;
        Ok(())
    }

    /// Append an empty option. The node kind is not checked.
    pub fn add_option(&mut self, id: &NodeId) -> Result<()> {
        self.node_mut(id)?.options.push(String::new());
        Ok(())
    }

    pub fn update_option(
        &mut self,
        id: &NodeId,
        index: usize,
        text: impl Into<String>,
    ) -> Result<()> {
        let node = self.node_mut(id)?;
        let len = node.options.len();
        let slot = node
            .options
            .get_mut(index)
            .ok_or_else(|| CallflowError::OptionIndexOutOfRange {
                node: id.clone(),
                index,
                len,
            })?;
        *slot = text.into();
        Ok(())
    }

    pub fn remove_option(&mut self, id: &NodeId, index: usize) -> Result<()> {
        let node = self.node_mut(id)?;
        if index >= node.options.len() {
            return Err(CallflowError::OptionIndexOutOfRange {
                node: id.clone(),
                index,
                len: node.options.len(),
            });
        }
        node.options.remove(index);
        Ok(())
    }

    /// Change the selection. `None` clears it.
    pub fn select_node(&mut self, id: Option<&NodeId>) -> Result<()> {
        if let Some(id) = id {
            if !self.state.contains_node(id) {
                return Err(CallflowError::NodeNotFound(id.clone()));
            }
        }
        self.state.selected_node = id.cloned();
        debug!(selected = ?self.state.selected_node, "Selection changed");
        Ok(())
    }

    pub fn delete_connection(&mut self, id: &ConnectionId) -> Result<()> {
        let index = self
            .state
            .connections
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| CallflowError::ConnectionNotFound(id.clone()))?;
        let conn = self.state.connections.remove(index);

        info!(
            connection = %id,
            source = %conn.source,
            target = %conn.target,
            "Connection deleted"
        );
        self.bus.publish(GraphEvent::ConnectionDeleted { id: id.clone() });
        Ok(())
    }

    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node> {
        self.state
            .node_mut(id)
            .ok_or_else(|| CallflowError::NodeNotFound(id.clone()))
    }

    /// Draw ids from the generator until one is not `taken`.
    pub(crate) fn fresh_id(
        &mut self,
        prefix: &str,
        taken: impl Fn(&WorkflowState, &str) -> bool,
    ) -> Result<String> {
        let mut last = String::new();
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.ids.next_id(prefix);
            if !taken(&self.state, &candidate) {
                return Ok(candidate);
            }
            debug!(id = %candidate, "Generated id already in use, retrying");
            last = candidate;
        }
        Err(CallflowError::IdCollision(last))
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.state.nodes.len())
            .field("connections", &self.state.connections.len())
            .field("selected_node", &self.state.selected_node)
            .field("connecting_from", &self.state.connecting_from)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callflow_core::types::{Connection, Severity};
    use callflow_test_utils::{
        assert_referentially_sound, drain_notifications, FixedIds, SequentialIds,
    };

    fn store() -> GraphStore {
        GraphStore::new(&EditorConfig::default(), Box::new(SequentialIds::new()))
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn test_add_node_defaults_and_selection() {
        let mut store = store();
        let new_id = store.add_node(NodeKind::Question).unwrap();

        let node = store.state().node(&new_id).unwrap();
        assert!(new_id.as_str().starts_with("question-"));
        assert_eq!(node.title, "Question");
        assert_eq!(node.content, "Enter your question here...");
        assert_eq!(node.position, Position::new(300.0, 300.0));
        assert!(node.options.is_empty());
        assert_eq!(store.state().selected_node, Some(new_id));
    }

    #[test]
    fn test_add_node_ids_unique() {
        let mut store = store();
        for kind in [NodeKind::Greeting, NodeKind::Question, NodeKind::Response] {
            for _ in 0..5 {
                store.add_node(kind).unwrap();
            }
        }
        assert_eq!(store.state().nodes.len(), 18);
        assert_referentially_sound(store.state());
    }

    #[test]
    fn test_add_node_gives_up_on_colliding_generator() {
        let mut store = GraphStore::new(
            &EditorConfig::default(),
            Box::new(FixedIds("greeting-1".into())),
        );
        let err = store.add_node(NodeKind::Greeting).unwrap_err();
        assert!(matches!(err, CallflowError::IdCollision(_)));
        assert_eq!(store.state().nodes.len(), 3);
    }

    #[test]
    fn test_add_node_publishes_success() {
        let mut store = store();
        let mut rx = store.subscribe();
        store.add_node(NodeKind::Greeting).unwrap();

        let events = drain_notifications(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Success);
        assert_eq!(events[0].message, "New greeting node added");
    }

    #[test]
    fn test_delete_node_cascades() {
        let mut store = store();
        store.delete_node(&id("question-1")).unwrap();

        assert_eq!(store.state().nodes.len(), 2);
        assert!(store.state().connections.is_empty());
        assert_referentially_sound(store.state());
    }

    #[test]
    fn test_delete_node_keeps_unrelated_connections() {
        let mut store = store();
        store.delete_node(&id("greeting-1")).unwrap();

        let conns = &store.state().connections;
        assert_eq!(conns.len(), 1);
        assert_eq!(conns[0].id, ConnectionId::from("conn-2"));
    }

    #[test]
    fn test_delete_node_clears_selection_and_pending_source() {
        let mut store = store();
        store.select_node(Some(&id("response-1"))).unwrap();
        store.begin_connection(&id("response-1")).unwrap();
        store.delete_node(&id("response-1")).unwrap();

        assert!(store.state().selected_node.is_none());
        assert!(store.state().connecting_from.is_none());
    }

    #[test]
    fn test_delete_missing_node_is_not_found() {
        let mut store = store();
        let mut rx = store.subscribe();
        let before = store.snapshot();

        let err = store.delete_node(&id("nope")).unwrap_err();
        assert!(matches!(err, CallflowError::NodeNotFound(_)));
        assert!(err.is_tolerated());
        assert_eq!(store.snapshot(), before);
        assert!(drain_notifications(&mut rx).is_empty());
    }

    #[test]
    fn test_update_text_fields() {
        let mut store = store();
        store.update_title(&id("greeting-1"), "Hello").unwrap();
        store.update_content(&id("greeting-1"), "Hi there").unwrap();

        let node = store.state().node(&id("greeting-1")).unwrap();
        assert_eq!(node.title, "Hello");
        assert_eq!(node.content, "Hi there");

        assert!(store.update_title(&id("ghost"), "x").is_err());
    }

    #[test]
    fn test_set_position_idempotent() {
        let mut once = store();
        once.set_position(&id("greeting-1"), Position::new(-40.0, 12.5)).unwrap();

        let mut twice = store();
        twice.set_position(&id("greeting-1"), Position::new(-40.0, 12.5)).unwrap();
        twice.set_position(&id("greeting-1"), Position::new(-40.0, 12.5)).unwrap();

        assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn test_option_editing() {
        let mut store = store();
        let r = id("response-1");
        store.add_option(&r).unwrap();
        store.update_option(&r, 2, "Maybe").unwrap();
        store.remove_option(&r, 0).unwrap();

        let node = store.state().node(&r).unwrap();
        assert_eq!(node.options, vec!["No", "Maybe"]);
    }

    #[test]
    fn test_option_index_out_of_range_is_noop() {
        let mut store = store();
        let r = id("response-1");
        let before = store.snapshot();

        assert!(matches!(
            store.update_option(&r, 5, "x"),
            Err(CallflowError::OptionIndexOutOfRange { index: 5, len: 2, .. })
        ));
        assert!(store.remove_option(&r, 2).is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_add_option_on_non_response_node() {
        let mut store = store();
        store.add_option(&id("greeting-1")).unwrap();
        let node = store.state().node(&id("greeting-1")).unwrap();
        assert_eq!(node.options, vec![String::new()]);
    }

    #[test]
    fn test_select_node() {
        let mut store = store();
        store.select_node(Some(&id("question-1"))).unwrap();
        assert_eq!(store.state().selected_node, Some(id("question-1")));

        assert!(store.select_node(Some(&id("ghost"))).is_err());
        assert_eq!(store.state().selected_node, Some(id("question-1")));

        store.select_node(None).unwrap();
        assert!(store.state().selected_node.is_none());
    }

    #[test]
    fn test_delete_connection() {
        let mut store = store();
        let mut rx = store.subscribe();
        store.delete_connection(&ConnectionId::from("conn-1")).unwrap();

        assert_eq!(store.state().connections.len(), 1);
        assert_eq!(drain_notifications(&mut rx)[0].message, "Connection removed");
        assert!(matches!(
            store.delete_connection(&ConnectionId::from("conn-1")),
            Err(CallflowError::ConnectionNotFound(_))
        ));
    }

    #[test]
    fn test_from_state_rejects_dangling() {
        let mut state = demo_workflow();
        state
            .connections
            .push(Connection::new("conn-x", "response-1", "missing"));
        let result = GraphStore::from_state(
            state,
            &EditorConfig::default(),
            Box::new(SequentialIds::new()),
        );
        assert!(matches!(result, Err(CallflowError::InvalidState(_))));
    }

    #[test]
    fn test_unseeded_store_is_empty() {
        let mut config = EditorConfig::default();
        config.session.seed_demo = false;
        let store = GraphStore::new(&config, Box::new(SequentialIds::new()));
        assert!(store.state().nodes.is_empty());
        assert!(store.state().connections.is_empty());
    }
}
