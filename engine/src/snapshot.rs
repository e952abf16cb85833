//! Single-slot cache holding the previous snapshot of the active document.

use tracing::trace;

/// Holds the last known content of the active document.
///
/// There is exactly one slot: every [`reset`](Self::reset) overwrites the
/// previous snapshot. No history is kept.
#[derive(Debug, Default, Clone)]
pub struct SnapshotCache {
    content: Option<String>,
}

impl SnapshotCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached snapshot with `content`.
    pub fn reset(&mut self, content: impl Into<String>) {
        let content = content.into();
        trace!(bytes = content.len(), "Snapshot cache reset");
        self.content = Some(content);
    }

    /// Returns the cached snapshot, if any.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Drops the cached snapshot.
    pub fn clear(&mut self) {
        self.content = None;
    }

    /// Returns true if `content` equals the cached snapshot.
    #[must_use]
    pub fn matches(&self, content: &str) -> bool {
        self.current() == Some(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let cache = SnapshotCache::new();
        assert!(cache.current().is_none());
        assert!(!cache.matches(""));
    }

    #[test]
    fn reset_overwrites() {
        let mut cache = SnapshotCache::new();
        cache.reset("first");
        cache.reset("second");
        assert_eq!(cache.current(), Some("second"));
        assert!(cache.matches("second"));
        assert!(!cache.matches("first"));
    }

    #[test]
    fn clear_empties_slot() {
        let mut cache = SnapshotCache::new();
        cache.reset("content");
        cache.clear();
        assert!(cache.current().is_none());
    }
}
