//! Graph editing core for the call-flow canvas.
//!
//! A call script is a set of typed `Node`s joined by directed `Connection`s.
//! The `GraphStore` owns that state and is the only thing that mutates it.
//! New edges come from a two-step gesture (pick a source, then a target)
//! implemented in `connect`. Edge curves are recomputed from positions by the
//! pure functions in `geometry`. The `Editor` turns single UI events into store
//! calls, one at a time.

pub mod connect;
pub mod drag;
pub mod editor;
pub mod geometry;
pub mod metadata;
pub mod seed;
pub mod store;

pub use connect::ConnectionGesture;
pub use drag::{ActiveDrag, DragTracker};
pub use editor::{Editor, EditorEvent};
pub use geometry::{edge_path, edge_paths, preview_path, EdgePath, Footprint, PathSpec};
pub use seed::demo_workflow;
pub use store::GraphStore;
