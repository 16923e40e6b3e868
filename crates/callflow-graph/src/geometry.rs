//! Edge curves between node footprints.
//!
//! Every edge is a cubic bezier from the middle of the source's bottom edge to
//! the middle of the target's top edge. Both control points sit at the
//! vertical midpoint, so the curve leaves and arrives moving straight up or down.

use serde::Serialize;

use callflow_core::config::CanvasConfig;
use callflow_core::types::{ConnectionId, Position, WorkflowState};

/// Size of a rendered node in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Footprint {
    pub width: f64,
    pub height: f64,
}

impl Default for Footprint {
    fn default() -> Self {
        Self {
            width: 256.0,
            height: 130.0,
        }
    }
}

impl From<&CanvasConfig> for Footprint {
    fn from(canvas: &CanvasConfig) -> Self {
        Self {
            width: canvas.node_width,
            height: canvas.node_height,
        }
    }
}

impl Footprint {
    /// Where edges leave a node placed at `position`.
    pub fn output_anchor(&self, position: Position) -> Position {
        Position::new(position.x + self.width / 2.0, position.y + self.height)
    }

    /// Where edges enter a node placed at `position`.
    pub fn input_anchor(&self, position: Position) -> Position {
        Position::new(position.x + self.width / 2.0, position.y)
    }
}

/// A cubic bezier segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathSpec {
    pub start: Position,
    pub control1: Position,
    pub control2: Position,
    pub end: Position,
}

impl PathSpec {
    /// SVG path data: `M sx,sy C c1x,c1y c2x,c2y ex,ey`.
    pub fn to_svg(&self) -> String {
        format!(
            "M{},{} C{},{} {},{} {},{}",
            self.start.x,
            self.start.y,
            self.control1.x,
            self.control1.y,
            self.control2.x,
            self.control2.y,
            self.end.x,
            self.end.y,
        )
    }

    pub fn translated(&self, by: Position) -> Self {
        Self {
            start: self.start + by,
            control1: self.control1 + by,
            control2: self.control2 + by,
            end: self.end + by,
        }
    }
}

fn vertical_s_curve(start: Position, end: Position) -> PathSpec {
    let mid_y = (start.y + end.y) / 2.0;
    PathSpec {
        start,
        control1: Position::new(start.x, mid_y),
        control2: Position::new(end.x, mid_y),
        end,
    }
}

/// Curve for an edge between nodes at `source` and `target`.
pub fn edge_path(source: Position, target: Position, footprint: Footprint) -> PathSpec {
    vertical_s_curve(footprint.output_anchor(source), footprint.input_anchor(target))
}

/// Curve from a node at `source` to the pointer, for an unfinished connection.
pub fn preview_path(source: Position, pointer: Position, footprint: Footprint) -> PathSpec {
    vertical_s_curve(footprint.output_anchor(source), pointer)
}

/// The curve of one connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePath {
    pub id: ConnectionId,
    pub path: PathSpec,
}

/// Recompute a curve for every connection, in connection order.
///
/// Connections with a missing endpoint are skipped.
pub fn edge_paths(state: &WorkflowState, footprint: Footprint) -> Vec<EdgePath> {
    state
        .connections
        .iter()
        .filter_map(|conn| {
            let source = state.node(&conn.source)?;
            let target = state.node(&conn.target)?;
            Some(EdgePath {
                id: conn.id.clone(),
                path: edge_path(source.position, target.position, footprint),
            })
        })
        .collect()
}

/// Preview curve for the pending connection, if a gesture is in progress.
pub fn pending_preview(
    state: &WorkflowState,
    pointer: Position,
    footprint: Footprint,
) -> Option<PathSpec> {
    let source = state.connecting_from.as_ref()?;
    let node = state.node(source)?;
    Some(preview_path(node.position, pointer, footprint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_workflow;
    use callflow_core::types::{Connection, NodeId};

    #[test]
    fn test_edge_path_anchors() {
        let path = edge_path(
            Position::new(300.0, 100.0),
            Position::new(300.0, 300.0),
            Footprint::default(),
        );
        assert_eq!(path.start, Position::new(428.0, 230.0));
        assert_eq!(path.end, Position::new(428.0, 300.0));
        assert_eq!(path.control1, Position::new(428.0, 265.0));
        assert_eq!(path.control2, Position::new(428.0, 265.0));
        assert_eq!(path.to_svg(), "M428,230 C428,265 428,265 428,300");
    }

    #[test]
    fn test_edge_path_offset_nodes() {
        let path = edge_path(
            Position::new(0.0, 0.0),
            Position::new(400.0, -200.0),
            Footprint::default(),
        );
        // Control points share the midpoint height but keep their own x.
        assert_eq!(path.control1, Position::new(128.0, -35.0));
        assert_eq!(path.control2, Position::new(528.0, -35.0));
        assert_eq!(path.end, Position::new(528.0, -200.0));
    }

    #[test]
    fn test_edge_path_deterministic() {
        let a = Position::new(12.0, 40.0);
        let b = Position::new(-80.0, 410.0);
        let f = Footprint::default();
        assert_eq!(edge_path(a, b, f), edge_path(a, b, f));
    }

    #[test]
    fn test_edge_path_translation() {
        let f = Footprint::default();
        let a = Position::new(10.0, 20.0);
        let b = Position::new(300.0, 400.0);
        let by = Position::new(-64.0, 32.0);

        let moved = edge_path(a + by, b + by, f);
        assert_eq!(moved, edge_path(a, b, f).translated(by));
    }

    #[test]
    fn test_preview_ends_at_pointer() {
        let path = preview_path(
            Position::new(300.0, 100.0),
            Position::new(50.0, 50.0),
            Footprint::default(),
        );
        assert_eq!(path.start, Position::new(428.0, 230.0));
        assert_eq!(path.end, Position::new(50.0, 50.0));
        assert_eq!(path.control1.y, 140.0);
    }

    #[test]
    fn test_custom_footprint() {
        let f = Footprint {
            width: 100.0,
            height: 50.0,
        };
        let path = edge_path(Position::new(0.0, 0.0), Position::new(0.0, 150.0), f);
        assert_eq!(path.start, Position::new(50.0, 50.0));
        assert_eq!(path.end, Position::new(50.0, 150.0));
    }

    #[test]
    fn test_edge_paths_follow_connections() {
        let state = demo_workflow();
        let paths = edge_paths(&state, Footprint::default());
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].id, ConnectionId::from("conn-1"));
        assert_eq!(paths[1].path.to_svg(), "M428,430 C428,465 428,465 428,500");
    }

    #[test]
    fn test_edge_paths_skip_dangling() {
        let mut state = demo_workflow();
        state
            .connections
            .push(Connection::new("conn-x", "greeting-1", "ghost"));
        assert_eq!(edge_paths(&state, Footprint::default()).len(), 2);
    }

    #[test]
    fn test_pending_preview() {
        let mut state = demo_workflow();
        let pointer = Position::new(0.0, 0.0);
        assert!(pending_preview(&state, pointer, Footprint::default()).is_none());

        state.connecting_from = Some(NodeId::from("greeting-1"));
        let path = pending_preview(&state, pointer, Footprint::default()).unwrap();
        assert_eq!(path.start, Position::new(428.0, 230.0));
    }
}
