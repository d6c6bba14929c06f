//! Mutation result types.

use pagegraph_core::{EdgeId, EntityId, VertexId};

/// What a primitive did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Created,
    Deleted,
    Updated,
    Renamed,
}

/// Outcome of a successful primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub kind: OutcomeKind,
    /// The (resolved) entity the primitive touched.
    pub entity: EntityId,
    /// Index of the record written to the transaction log, if one was.
    pub txn_detail_index: Option<usize>,
}

impl MutationOutcome {
    pub fn new(kind: OutcomeKind, entity: impl Into<EntityId>, txn_detail_index: Option<usize>) -> Self {
        Self {
            kind,
            entity: entity.into(),
            txn_detail_index,
        }
    }

    /// Get created vertex ID if this is a Created result for a vertex.
    pub fn created_vertex(&self) -> Option<&VertexId> {
        match self.kind {
            OutcomeKind::Created => self.entity.as_vertex(),
            _ => None,
        }
    }

    /// Get created edge ID if this is a Created result for an edge.
    pub fn created_edge(&self) -> Option<&EdgeId> {
        match self.kind {
            OutcomeKind::Created => self.entity.as_edge(),
            _ => None,
        }
    }
}
