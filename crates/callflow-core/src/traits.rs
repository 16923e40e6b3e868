use uuid::Uuid;

/// Identity generator for new nodes and connections.
///
/// The store only relies on uniqueness; the format is up to the implementation.
pub trait IdGenerator: Send + 'static {
    /// Produce a fresh identifier starting with `prefix`.
    fn next_id(&mut self, prefix: &str) -> String;
}

/// `<prefix>-<uuid v4>` identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_ids_are_prefixed_and_distinct() {
        let mut ids = UuidIds;
        let a = ids.next_id("conn");
        let b = ids.next_id("conn");
        assert!(a.starts_with("conn-"));
        assert_ne!(a, b);
    }
}
