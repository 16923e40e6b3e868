//! Deterministic fixtures shared by the callflow test suites.

use std::collections::HashSet;

use tokio::sync::broadcast::Receiver;

use callflow_core::types::{Notification, WorkflowState};
use callflow_core::IdGenerator;

/// Counter-based ids: `<prefix>-t1`, `<prefix>-t2`, ...
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{}-t{}", prefix, self.next)
    }
}

/// Always hands out the same id. Useful for exercising collision handling.
#[derive(Debug, Clone)]
pub struct FixedIds(pub String);

impl IdGenerator for FixedIds {
    fn next_id(&mut self, _prefix: &str) -> String {
        self.0.clone()
    }
}

/// Collect every notification currently buffered on `rx`.
pub fn drain_notifications(rx: &mut Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

/// Panic unless every referential invariant of `state` holds.
pub fn assert_referentially_sound(state: &WorkflowState) {
    if let Err(e) = state.validate() {
        panic!("workflow state is unsound: {e}");
    }
    let ids: HashSet<_> = state.nodes.iter().map(|n| &n.id).collect();
    assert_eq!(ids.len(), state.nodes.len(), "node ids must be unique");
}
