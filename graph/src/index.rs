//! Label index: label -> vertex ids.

use pagegraph_core::VertexId;
use std::collections::{BTreeSet, HashMap};

/// Label index: label -> Set<VertexId>.
///
/// Buckets are ordered sets so that an insert undone by a delete (or the
/// reverse) leaves the bucket exactly as it was.
#[derive(Debug, Default, Clone)]
pub struct LabelIndex {
    index: HashMap<String, BTreeSet<VertexId>>,
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: &str, vertex_id: VertexId) {
        self.index
            .entry(label.to_string())
            .or_default()
            .insert(vertex_id);
    }

    /// Remove a vertex from a bucket, dropping the bucket once empty.
    pub fn remove(&mut self, label: &str, vertex_id: &VertexId) {
        if let Some(set) = self.index.get_mut(label) {
            set.remove(vertex_id);
            if set.is_empty() {
                self.index.remove(label);
            }
        }
    }

    pub fn contains(&self, label: &str, vertex_id: &VertexId) -> bool {
        self.index
            .get(label)
            .is_some_and(|set| set.contains(vertex_id))
    }

    pub fn get(&self, label: &str) -> impl Iterator<Item = &VertexId> + '_ {
        self.index.get(label).into_iter().flat_map(|set| set.iter())
    }

    pub fn has_bucket(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.index.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.index.clear();
    }
}
