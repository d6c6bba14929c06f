//! The diff shape exchanged with the persistence backend.

use pagegraph_core::{Edge, EdgeId, EntityId, Vertex, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::record::{TxnOp, TxnRecord};

/// `{vertexes, edges, deleted_vertexes, deleted_edges}`.
///
/// Produced by committing a transaction, and consumed in the same shape when
/// the server sends back its authoritative state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxnDiff {
    #[serde(default)]
    pub vertexes: BTreeMap<VertexId, Vertex>,
    #[serde(default)]
    pub edges: BTreeMap<EdgeId, Edge>,
    #[serde(default)]
    pub deleted_vertexes: Vec<VertexId>,
    #[serde(default)]
    pub deleted_edges: Vec<EdgeId>,
}

impl TxnDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the diff carries nothing.
    pub fn is_empty(&self) -> bool {
        self.vertexes.is_empty()
            && self.edges.is_empty()
            && self.deleted_vertexes.is_empty()
            && self.deleted_edges.is_empty()
    }

    /// Fold an ordered record list into a diff.
    ///
    /// The last state of every touched entity wins. An entity created and
    /// deleted inside the same list appears nowhere.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TxnRecord>) -> Self {
        let mut diff = TxnDiff::new();
        let mut created: HashSet<EntityId> = HashSet::new();

        for record in records {
            match &record.op {
                TxnOp::InsertVertex { stored, .. } => {
                    created.insert(record.entity_id.clone());
                    diff.deleted_vertexes.retain(|id| *id != stored.id);
                    diff.vertexes.insert(stored.id.clone(), stored.detached());
                }
                TxnOp::MergeVertex { after, .. } | TxnOp::ReplaceVertex { after, .. } => {
                    diff.vertexes.insert(after.id.clone(), after.detached());
                }
                TxnOp::DeleteVertex { original } => {
                    diff.vertexes.remove(&original.id);
                    if !created.remove(&record.entity_id)
                        && !diff.deleted_vertexes.contains(&original.id)
                    {
                        diff.deleted_vertexes.push(original.id.clone());
                    }
                }
                TxnOp::InsertEdge { stored, .. } => {
                    created.insert(record.entity_id.clone());
                    diff.deleted_edges.retain(|id| *id != stored.id);
                    diff.edges.insert(stored.id.clone(), stored.clone());
                }
                TxnOp::ReplaceEdge { after, .. } => {
                    diff.edges.insert(after.id.clone(), after.clone());
                }
                TxnOp::DeleteEdge { original, .. } => {
                    diff.edges.remove(&original.id);
                    if !created.remove(&record.entity_id)
                        && !diff.deleted_edges.contains(&original.id)
                    {
                        diff.deleted_edges.push(original.id.clone());
                    }
                }
            }
        }

        diff
    }
}
