//! Fine-grained change tracking for the Store.
//!
//! Every narrow write names the key-paths it touched. Each path carries a
//! revision counter, and listeners are told which paths changed. Inside a
//! batch, notifications are held until the outermost batch closes.

use pagegraph_core::{EdgeId, VertexId};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A key-path inside the Store that a dependent can watch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorePath {
    /// Existence (and id) of a vertex.
    Vertex(VertexId),
    /// The label list of a vertex.
    VertexLabels(VertexId),
    /// One property of a vertex.
    VertexProp(VertexId, String),
    /// One incoming bucket of a vertex.
    VertexIn(VertexId, String),
    /// One outgoing bucket of a vertex.
    VertexOut(VertexId, String),
    /// Existence (and endpoints) of an edge.
    Edge(EdgeId),
    /// One property of an edge.
    EdgeProp(EdgeId, String),
    /// One label bucket of the label index.
    Label(String),
}

/// Handle returned by [`crate::Graph::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&[StorePath])>;

#[derive(Default)]
pub(crate) struct ChangeTracker {
    revisions: HashMap<StorePath, u64>,
    pending: Vec<StorePath>,
    depth: usize,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for ChangeTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("tracked_paths", &self.revisions.len())
            .field("pending", &self.pending.len())
            .field("depth", &self.depth)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ChangeTracker {
    pub(crate) fn touch(&mut self, path: StorePath) {
        *self.revisions.entry(path.clone()).or_insert(0) += 1;
        self.pending.push(path);
    }

    pub(crate) fn revision(&self, path: &StorePath) -> u64 {
        self.revisions.get(path).copied().unwrap_or(0)
    }

    pub(crate) fn open(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.flush_if_idle();
    }

    pub(crate) fn in_batch(&self) -> bool {
        self.depth > 0
    }

    /// Deliver pending paths unless a batch is open.
    pub(crate) fn flush_if_idle(&mut self) {
        if self.depth > 0 || self.pending.is_empty() {
            return;
        }
        let mut seen = HashSet::new();
        let paths: Vec<StorePath> = self
            .pending
            .drain(..)
            .filter(|p| seen.insert(p.clone()))
            .collect();
        for (_, listener) in self.listeners.iter_mut() {
            listener(&paths);
        }
    }

    pub(crate) fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }
}
