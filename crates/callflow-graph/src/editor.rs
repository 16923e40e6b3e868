use tracing::{debug, warn};

use callflow_core::error::{CallflowError, Result};
use callflow_core::settings::NodeSettings;
use callflow_core::types::{ConnectionId, NodeId, NodeKind, Position};

use crate::drag::DragTracker;
use crate::geometry::{edge_paths, pending_preview, EdgePath, Footprint, PathSpec};
use crate::store::GraphStore;

/// One user interaction on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    AddNode(NodeKind),
    NodeClicked(NodeId),
    /// Click on empty canvas. Clears the selection only.
    CanvasClicked,
    /// Port under a node: starts a connection.
    OutputPortClicked(NodeId),
    /// Port above a node: finishes a connection.
    InputPortClicked(NodeId),
    EscapePressed,
    DragStarted { node: NodeId, pointer: Position },
    PointerMoved(Position),
    DragEnded,
    ViewportResized { width: f64, height: f64 },
    TitleEdited { node: NodeId, text: String },
    ContentEdited { node: NodeId, text: String },
    OptionAdded(NodeId),
    OptionEdited { node: NodeId, index: usize, text: String },
    OptionRemoved { node: NodeId, index: usize },
    ColorChosen { node: NodeId, color: Option<String> },
    SettingsSaved { node: NodeId, settings: NodeSettings },
    DeleteNodeClicked(NodeId),
    DeleteConnectionClicked(ConnectionId),
}

/// Drives a `GraphStore` from UI events, one event at a time.
#[derive(Debug)]
pub struct Editor {
    store: GraphStore,
    drag: DragTracker,
    pointer: Position,
    viewport: Option<(f64, f64)>,
    footprint: Footprint,
}

impl Editor {
    pub fn new(store: GraphStore) -> Self {
        let footprint = Footprint::from(store.canvas());
        Self {
            store,
            drag: DragTracker::new(),
            pointer: Position::default(),
            viewport: None,
            footprint,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn pointer(&self) -> Position {
        self.pointer
    }

    pub fn drag(&self) -> &DragTracker {
        &self.drag
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// Curves for every connection in the current state.
    pub fn edge_paths(&self) -> Vec<EdgePath> {
        edge_paths(self.store.state(), self.footprint)
    }

    /// Curve from the pending source to the pointer, while connecting.
    pub fn preview_path(&self) -> Option<PathSpec> {
        pending_preview(self.store.state(), self.pointer, self.footprint)
    }

    /// Where a node added now would be placed.
    pub fn spawn_position(&self) -> Position {
        let canvas = self.store.canvas();
        match self.viewport {
            Some((width, height)) => Position::new(
                width / 2.0 - self.footprint.width / 2.0,
                height / 2.0 - canvas.spawn_vertical_offset,
            ),
            None => canvas.spawn_position(),
        }
    }

    /// Apply one event and log, rather than return, any failure.
    ///
    /// This is the entry point for UI code: nothing an event can do is fatal.
    pub fn dispatch(&mut self, event: EditorEvent) {
        if let Err(e) = self.handle(event) {
            if e.is_tolerated() {
                debug!(error = %e, "Event ignored");
            } else {
                warn!(error = %e, "Event rejected");
            }
        }
    }

    /// Apply one event, returning the outcome of the store call it maps to.
    pub fn handle(&mut self, event: EditorEvent) -> Result<()> {
        match event {
            EditorEvent::AddNode(kind) => {
                let position = self.spawn_position();
                self.store.add_node_at(kind, position).map(|_| ())
            }
            EditorEvent::NodeClicked(id) => self.store.select_node(Some(&id)),
            EditorEvent::CanvasClicked => self.store.select_node(None),
            EditorEvent::OutputPortClicked(id) => self.store.begin_connection(&id),
            EditorEvent::InputPortClicked(id) => {
                self.store.complete_connection(&id).map(|_| ())
            }
            EditorEvent::EscapePressed => {
                self.store.cancel_connection();
                Ok(())
            }
            EditorEvent::DragStarted { node, pointer } => {
                let position = self
                    .store
                    .state()
                    .node(&node)
                    .map(|n| n.position)
                    .ok_or_else(|| CallflowError::NodeNotFound(node.clone()))?;
                self.pointer = pointer;
                self.drag.begin(node, pointer, position);
                Ok(())
            }
            EditorEvent::PointerMoved(pointer) => {
                self.pointer = pointer;
                let Some((node, position)) = self
                    .drag
                    .target_position(pointer)
                    .map(|(node, pos)| (node.clone(), pos))
                else {
                    return Ok(());
                };
                let result = self.store.set_position(&node, position);
                if result.is_err() {
                    // The dragged node was deleted mid-drag.
                    self.drag.end();
                }
                result
            }
            EditorEvent::DragEnded => {
                self.drag.end();
                Ok(())
            }
            EditorEvent::ViewportResized { width, height } => {
                self.viewport = Some((width, height));
                Ok(())
            }
            EditorEvent::TitleEdited { node, text } => self.store.update_title(&node, text),
            EditorEvent::ContentEdited { node, text } => self.store.update_content(&node, text),
            EditorEvent::OptionAdded(node) => self.store.add_option(&node),
            EditorEvent::OptionEdited { node, index, text } => {
                self.store.update_option(&node, index, text)
            }
            EditorEvent::OptionRemoved { node, index } => self.store.remove_option(&node, index),
            EditorEvent::ColorChosen { node, color } => self.store.set_color(&node, color),
            EditorEvent::SettingsSaved { node, settings } => {
                self.store.save_settings(&node, settings)
            }
            EditorEvent::DeleteNodeClicked(node) => self.store.delete_node(&node),
            EditorEvent::DeleteConnectionClicked(id) => self.store.delete_connection(&id),
        }
    }
}
