use callflow_core::types::{Connection, Node, NodeKind, Position, WorkflowState};

/// The sample call script a fresh session opens with.
///
/// A factory rather than a constant so every store starts from its own copy.
pub fn demo_workflow() -> WorkflowState {
    WorkflowState {
        nodes: vec![
            Node::new("greeting-1", NodeKind::Greeting, Position::new(300.0, 100.0))
                .with_content("Hello, this is Sam calling from Codebase."),
            Node::new("question-1", NodeKind::Question, Position::new(300.0, 300.0))
                .with_title("Initial Question")
                .with_content(
                    "I'm calling to discuss our new service that helps businesses like yours. \
                     Do you have a few minutes to chat?",
                ),
            Node::new("response-1", NodeKind::Response, Position::new(300.0, 500.0))
                .with_options(vec!["Yes".to_string(), "No".to_string()]),
        ],
        connections: vec![
            Connection::new("conn-1", "greeting-1", "question-1"),
            Connection::new("conn-2", "question-1", "response-1"),
        ],
        selected_node: None,
        connecting_from: None,
    }
}
