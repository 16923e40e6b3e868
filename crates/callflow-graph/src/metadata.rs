//! Task metadata attached to nodes.
//!
//! Settings are replaced wholesale and never validated here; the bag lives and
//! dies with its node.

use tracing::info;

use callflow_core::error::{CallflowError, Result};
use callflow_core::settings::NodeSettings;
use callflow_core::types::NodeId;

use crate::store::GraphStore;

impl GraphStore {
    /// Replace the node's whole settings bag.
    pub fn save_settings(&mut self, id: &NodeId, settings: NodeSettings) -> Result<()> {
        let version = settings.schema_version();
        self.node_mut(id)?.custom_settings = Some(settings);
        info!(node = %id, schema = version, "Node settings saved");
        Ok(())
    }

    /// Drop the node's settings, returning what was there.
    pub fn clear_settings(&mut self, id: &NodeId) -> Result<Option<NodeSettings>> {
        Ok(self.node_mut(id)?.custom_settings.take())
    }

    pub fn settings(&self, id: &NodeId) -> Result<Option<&NodeSettings>> {
        self.state
            .node(id)
            .map(|n| n.custom_settings.as_ref())
            .ok_or_else(|| CallflowError::NodeNotFound(id.clone()))
    }

    /// Whether the node should show its "has metadata" badge.
    pub fn has_metadata(&self, id: &NodeId) -> bool {
        self.state.node(id).is_some_and(|n| n.has_metadata())
    }
}
