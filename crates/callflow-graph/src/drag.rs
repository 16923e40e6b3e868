use callflow_core::types::{NodeId, Position};

/// A node being dragged, and where on it the pointer grabbed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub node: NodeId,
    /// Pointer position relative to the node's top-left corner at drag start.
    pub offset: Position,
}

/// Tracks at most one drag between drag-start and drag-end.
#[derive(Debug, Default)]
pub struct DragTracker {
    active: Option<ActiveDrag>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start dragging `node`, which currently sits at `node_position`.
    pub fn begin(&mut self, node: NodeId, pointer: Position, node_position: Position) {
        self.active = Some(ActiveDrag {
            node,
            offset: pointer - node_position,
        });
    }

    pub fn active(&self) -> Option<&ActiveDrag> {
        self.active.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Where the dragged node goes when the pointer is at `pointer`.
    pub fn target_position(&self, pointer: Position) -> Option<(&NodeId, Position)> {
        self.active
            .as_ref()
            .map(|drag| (&drag.node, pointer - drag.offset))
    }

    pub fn end(&mut self) -> Option<ActiveDrag> {
        self.active.take()
    }
}
