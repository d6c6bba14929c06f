//! Store error types.

use pagegraph_core::{Classify, EdgeId, ErrorClass, VertexId};
use thiserror::Error;

/// Errors raised by the Store's narrow writes.
///
/// The Store only guards its own structure; the mutation primitives check the
/// referential rules first and report richer errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// Vertex not found.
    #[error("Vertex not found: {0}")]
    VertexNotFound(VertexId),

    /// Edge not found.
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// A vertex with this id is already stored.
    #[error("Vertex already exists: {0}")]
    VertexExists(VertexId),

    /// An edge with this id is already stored.
    #[error("Edge already exists: {0}")]
    EdgeExists(EdgeId),
}

impl Classify for GraphError {
    fn class(&self) -> ErrorClass {
        match self {
            GraphError::VertexNotFound(_) | GraphError::EdgeNotFound(_) => ErrorClass::Referential,
            GraphError::VertexExists(_) | GraphError::EdgeExists(_) => ErrorClass::Validation,
        }
    }
}

/// Result type for Store operations.
pub type GraphResult<T> = Result<T, GraphError>;
