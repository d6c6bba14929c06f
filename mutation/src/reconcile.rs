//! Id reconciliation.
//!
//! Entities created on the client carry provisional ids (`"-1"`, `"-2"`, …)
//! until the authoritative backend assigns real ones. The [`IdMap`] records
//! every `provisional -> assigned` pair so that references written against
//! either id land on the same entity.

use pagegraph_core::{rewrite_prop_strings, EdgeId, Props, VertexId};
use pagegraph_graph::Graph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Provisional-to-assigned id pairs.
///
/// Vertex and edge ids share one namespace. Chains (`a -> b -> c`) resolve to
/// their final id; a cycle stops at the first repeated id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdMap {
    map: HashMap<String, String>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `old -> new`. A self-mapping is ignored.
    pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) {
        let (old, new) = (old.into(), new.into());
        if old != new {
            self.map.insert(old, new);
        }
    }

    /// Follow the map from `id` to its final id.
    pub fn resolve(&self, id: &str) -> String {
        let mut current = id;
        let mut seen: HashSet<&str> = HashSet::new();
        while let Some(next) = self.map.get(current) {
            if !seen.insert(current) {
                break;
            }
            current = next;
        }
        current.to_string()
    }

    pub fn resolve_vertex(&self, id: &VertexId) -> VertexId {
        VertexId::new(self.resolve(id.as_str()))
    }

    pub fn resolve_edge(&self, id: &EdgeId) -> EdgeId {
        EdgeId::new(self.resolve(id.as_str()))
    }

    /// Check whether `id` has been reconciled to something else.
    pub fn contains(&self, id: &str) -> bool {
        self.map.contains_key(id)
    }

    /// Fold another batch of pairs in; later pairs win.
    pub fn merge<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (old, new) in pairs {
            self.insert(old, new);
        }
    }

    /// Rewrite string property values that equal a reconciled id.
    /// Returns the number of values rewritten.
    pub fn remap_props(&self, props: &mut Props) -> usize {
        if self.map.is_empty() {
            return 0;
        }
        rewrite_prop_strings(props, &|s: &str| {
            self.contains(s).then(|| self.resolve(s))
        })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Mints client-side provisional ids: `"-1"`, `"-2"`, …
///
/// Skips any candidate already stored or already reconciled, so a minted id
/// never collides with a live entity.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_vertex_id(&mut self, graph: &Graph, ids: &IdMap) -> VertexId {
        VertexId::new(self.next_free(graph, ids))
    }

    pub fn next_edge_id(&mut self, graph: &Graph, ids: &IdMap) -> EdgeId {
        EdgeId::new(self.next_free(graph, ids))
    }

    fn next_free(&mut self, graph: &Graph, ids: &IdMap) -> String {
        loop {
            let candidate = format!("-{}", self.next);
            self.next += 1;
            let taken = ids.contains(&candidate)
                || graph.contains_vertex(&VertexId::new(candidate.as_str()))
                || graph.contains_edge(&EdgeId::new(candidate.as_str()));
            if !taken {
                return candidate;
            }
        }
    }
}
