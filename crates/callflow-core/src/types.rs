use std::collections::HashSet;
use std::ops::{Add, Sub};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CallflowError, Result};
use crate::settings::NodeSettings;

/// Identifier of a node on the canvas.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a connection between two nodes.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role a node plays in the call script.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Greeting,
    Question,
    Response,
}

impl NodeKind {
    /// Lowercase name, also used as the id prefix for new nodes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Question => "question",
            Self::Response => "response",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            Self::Greeting => "Greeting",
            Self::Question => "Question",
            Self::Response => "Response Branch",
        }
    }

    pub fn default_content(&self) -> &'static str {
        match self {
            Self::Greeting => "Enter your greeting message here...",
            Self::Question => "Enter your question here...",
            Self::Response => "Response Options:",
        }
    }

    /// Branch options a freshly created node starts with.
    pub fn default_options(&self) -> Vec<String> {
        match self {
            Self::Response => vec![String::new()],
            _ => vec![],
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in logical canvas units. The canvas is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A single step in the call flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub title: String,
    pub content: String,
    pub position: Position,
    /// Branch labels. Only rendered for response nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_settings: Option<NodeSettings>,
}

impl Node {
    /// A node of `kind` carrying that kind's default title, content and options.
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, position: Position) -> Self {
        Self {
            id: id.into(),
            kind,
            title: kind.default_title().to_string(),
            content: kind.default_content().to_string(),
            position,
            options: kind.default_options(),
            color: None,
            custom_settings: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// True when the attached settings bag carries any non-empty field.
    pub fn has_metadata(&self) -> bool {
        self.custom_settings
            .as_ref()
            .is_some_and(NodeSettings::has_metadata)
    }
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: NodeId,
    pub target: NodeId,
}

impl Connection {
    pub fn new(
        id: impl Into<ConnectionId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// True when either endpoint is `node`.
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

/// The whole editing session: nodes, connections and transient selection.
///
/// Node order is paint order; the last node paints on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    pub selected_node: Option<NodeId>,
    pub connecting_from: Option<NodeId>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|n| &n.id == id)
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| &c.id == id)
    }

    /// Whether an edge with this exact ordered pair already exists.
    pub fn has_connection_between(&self, source: &NodeId, target: &NodeId) -> bool {
        self.connections
            .iter()
            .any(|c| &c.source == source && &c.target == target)
    }

    /// Connections with `node` as either endpoint.
    pub fn connections_touching<'a>(
        &'a self,
        node: &'a NodeId,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.touches(node))
    }

    /// Check every referential invariant of the aggregate.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(&node.id) {
                return Err(CallflowError::InvalidState(format!(
                    "duplicate node id: {}",
                    node.id
                )));
            }
        }

        let mut conn_ids = HashSet::new();
        let mut pairs = HashSet::new();
        for conn in &self.connections {
            if !conn_ids.insert(&conn.id) {
                return Err(CallflowError::InvalidState(format!(
                    "duplicate connection id: {}",
                    conn.id
                )));
            }
            if !ids.contains(&conn.source) || !ids.contains(&conn.target) {
                return Err(CallflowError::InvalidState(format!(
                    "connection {} has a dangling endpoint",
                    conn.id
                )));
            }
            if !pairs.insert((&conn.source, &conn.target)) {
                return Err(CallflowError::InvalidState(format!(
                    "duplicate connection {} -> {}",
                    conn.source, conn.target
                )));
            }
        }

        for (field, value) in [
            ("selectedNode", &self.selected_node),
            ("connectingFrom", &self.connecting_from),
        ] {
            if let Some(id) = value {
                if !ids.contains(id) {
                    return Err(CallflowError::InvalidState(format!(
                        "{field} references missing node {id}"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// How prominently the render layer should show a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Something the graph store did that the user should hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    NodeAdded { id: NodeId, kind: NodeKind },
    NodeDeleted { id: NodeId, removed_connections: usize },
    ConnectionStarted { source: NodeId },
    ConnectionAdded { id: ConnectionId, source: NodeId, target: NodeId },
    /// The pair already existed; nothing was created.
    ConnectionRejected { source: NodeId, target: NodeId },
    ConnectionDeleted { id: ConnectionId },
    ConnectionCancelled { source: NodeId },
}

impl GraphEvent {
    pub fn severity(&self) -> Severity {
        match self {
            Self::ConnectionStarted { .. } | Self::ConnectionCancelled { .. } => Severity::Info,
            Self::ConnectionRejected { .. } => Severity::Error,
            _ => Severity::Success,
        }
    }

    /// User-facing text for this event.
    pub fn message(&self) -> String {
        match self {
            Self::NodeAdded { kind, .. } => format!("New {} node added", kind),
            Self::NodeDeleted { .. } => "Node deleted".to_string(),
            Self::ConnectionStarted { .. } => "Select another node to connect to".to_string(),
            Self::ConnectionAdded { .. } => "Connection created".to_string(),
            Self::ConnectionRejected { .. } => "Connection already exists".to_string(),
            Self::ConnectionDeleted { .. } => "Connection removed".to_string(),
            Self::ConnectionCancelled { .. } => "Connection cancelled".to_string(),
        }
    }
}

/// Fire-and-forget signal broadcast to the notification collaborator.
#[derive(Debug, Clone)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub event: GraphEvent,
    pub timestamp: DateTime<Utc>,
}

impl From<GraphEvent> for Notification {
    fn from(event: GraphEvent) -> Self {
        Self {
            severity: event.severity(),
            message: event.message(),
            event,
            timestamp: Utc::now(),
        }
    }
}
