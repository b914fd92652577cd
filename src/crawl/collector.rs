//! Order-preserving, deduplicated match list.

use std::collections::HashSet;

use crate::remote::RemotePath;

/// Matched remote paths in discovery order, each at most once.
#[derive(Debug, Clone, Default)]
pub struct MatchCollector {
    order: Vec<RemotePath>,
    seen: HashSet<RemotePath>,
}

impl MatchCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `path` unless already present. Returns whether it was added.
    pub fn add(&mut self, path: RemotePath) -> bool {
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.order.push(path);
        true
    }

    #[must_use]
    pub fn all(&self) -> &[RemotePath] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn contains(&self, path: &RemotePath) -> bool {
        self.seen.contains(path)
    }
}
