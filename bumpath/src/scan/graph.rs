//! Container link graph.

use std::collections::HashMap;

use crate::unify::UnifiedKey;

/// Directed links between containers that were found present.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    edges: HashMap<UnifiedKey, Vec<UnifiedKey>>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` links to `to`. Repeated edges are ignored.
    pub fn add_edge(&mut self, from: &UnifiedKey, to: &UnifiedKey) {
        let links = self.edges.entry(from.clone()).or_default();
        if !links.contains(to) {
            links.push(to.clone());
        }
    }

    /// Direct links of a container, in discovery order.
    pub fn links(&self, from: &UnifiedKey) -> &[UnifiedKey] {
        self.edges.get(from).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of containers with at least one outgoing link.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }
}
