//! Id validation for the primitives that introduce or rename an entity.

use pagegraph_core::{EdgeId, VertexId};

use crate::error::{MutationError, MutationResult};

/// Reject an empty or whitespace-only vertex id.
pub fn validate_vertex_id(id: &VertexId) -> MutationResult<()> {
    validate_id("vertex", id.as_str())
}

/// Reject an empty or whitespace-only edge id.
pub fn validate_edge_id(id: &EdgeId) -> MutationResult<()> {
    validate_id("edge", id.as_str())
}

fn validate_id(kind: &'static str, id: &str) -> MutationResult<()> {
    if id.trim().is_empty() {
        return Err(MutationError::invalid_id(kind, id));
    }
    Ok(())
}
