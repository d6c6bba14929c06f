//! Mutation error types.

use pagegraph_core::{Classify, EdgeId, ErrorClass, VertexId};
use pagegraph_graph::GraphError;
use pagegraph_transaction::TransactionError;
use thiserror::Error;

/// Result type for mutation operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Errors that can occur during mutation execution.
///
/// A primitive that returns one of these has left the Store, the log and the
/// channel untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MutationError {
    #[error("Invalid {kind} id {id:?}: ids must not be blank")]
    InvalidId { kind: &'static str, id: String },

    #[error("Duplicate vertex id: {0}")]
    DuplicateId(VertexId),

    #[error("Duplicate edge id: {0}")]
    DuplicateEdge(EdgeId),

    #[error("Invalid edge {edge}: endpoint {missing} does not exist")]
    InvalidEdge { edge: EdgeId, missing: VertexId },

    #[error("Vertex not found: {0}")]
    NotFound(VertexId),

    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    #[error("Cannot delete vertex {id}: it still has {} outgoing edge(s)", edges.len())]
    HasChildren { id: VertexId, edges: Vec<EdgeId> },

    #[error("Cannot delete vertex {id}: it still has parents {parents:?} via {edges:?}")]
    HasParents {
        id: VertexId,
        parents: Vec<VertexId>,
        edges: Vec<EdgeId>,
    },

    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("store error: {0}")]
    Store(#[from] GraphError),
}

impl MutationError {
    pub fn invalid_id(kind: &'static str, id: impl Into<String>) -> Self {
        Self::InvalidId {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid_edge(edge: EdgeId, missing: VertexId) -> Self {
        Self::InvalidEdge { edge, missing }
    }

    pub fn has_children(id: VertexId, edges: Vec<EdgeId>) -> Self {
        Self::HasChildren { id, edges }
    }

    pub fn has_parents(id: VertexId, parents: Vec<VertexId>, edges: Vec<EdgeId>) -> Self {
        Self::HasParents { id, parents, edges }
    }

    /// True for the errors a replayed (already applied) create produces.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateId(_) | Self::DuplicateEdge(_))
    }
}

impl Classify for MutationError {
    fn class(&self) -> ErrorClass {
        match self {
            MutationError::InvalidId { .. }
            | MutationError::DuplicateId(_)
            | MutationError::DuplicateEdge(_) => ErrorClass::Validation,
            MutationError::InvalidEdge { .. }
            | MutationError::NotFound(_)
            | MutationError::EdgeNotFound(_)
            | MutationError::HasChildren { .. }
            | MutationError::HasParents { .. } => ErrorClass::Referential,
            MutationError::Transaction(e) => e.class(),
            MutationError::Store(e) => e.class(),
        }
    }
}
