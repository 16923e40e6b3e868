use thiserror::Error;

use crate::types::{ConnectionId, NodeId};

#[derive(Debug, Error)]
pub enum CallflowError {
    // Reference errors
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    #[error("Option index {index} out of range for node {node} ({len} options)")]
    OptionIndexOutOfRange {
        node: NodeId,
        index: usize,
        len: usize,
    },

    // Connection gesture errors
    #[error("Connection already exists: {from} -> {to}")]
    DuplicateConnection { from: NodeId, to: NodeId },

    #[error("Cannot connect node to itself: {0}")]
    SelfConnection(NodeId),

    #[error("No connection in progress")]
    NoPendingConnection,

    // Identity errors
    #[error("Id generator kept producing taken ids (last: {0})")]
    IdCollision(String),

    // Aggregate validation errors
    #[error("Invalid workflow state: {0}")]
    InvalidState(String),

    // Metadata errors
    #[error("Settings error: {0}")]
    Settings(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CallflowError {
    /// Errors the editor swallows without telling the user.
    ///
    /// Missing references, bad option indices and gesture misfires are
    /// no-ops; only a duplicate connection is surfaced (via notification).
    pub fn is_tolerated(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound(_)
                | Self::ConnectionNotFound(_)
                | Self::OptionIndexOutOfRange { .. }
                | Self::SelfConnection(_)
                | Self::NoPendingConnection
        )
    }
}

pub type Result<T> = std::result::Result<T, CallflowError>;
