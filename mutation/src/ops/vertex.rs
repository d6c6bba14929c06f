//! Vertex create/delete.

use pagegraph_core::{TxnId, Vertex, VertexId};
use pagegraph_sync::SyncMessage;
use pagegraph_transaction::TxnOp;
use tracing::{debug, warn};

use crate::error::{MutationError, MutationResult};
use crate::executor::MutationExecutor;
use crate::options::MutationOptions;
use crate::result::{MutationOutcome, OutcomeKind};
use crate::validation::validate_vertex_id;

impl MutationExecutor<'_> {
    /// Add a vertex.
    ///
    /// The id is resolved, string props naming a reconciled id are rewritten,
    /// and the stored copy starts with empty adjacency whatever `IN`/`OUT` the
    /// input carried.
    pub fn create_vertex(
        &mut self,
        txn_id: TxnId,
        vertex: Vertex,
        opts: &MutationOptions,
    ) -> MutationResult<MutationOutcome> {
        validate_vertex_id(&vertex.id)?;
        let id = self.ids.resolve_vertex(&vertex.id);
        let listed = vertex
            .labels
            .iter()
            .any(|label| self.graph.label_contains(label, &id));
        if self.graph.contains_vertex(&id) || listed {
            return Err(MutationError::DuplicateId(id));
        }

        let mut stored = vertex.detached();
        stored.id = id.clone();
        self.ids.remap_props(&mut stored.props);
        self.graph.insert_vertex(stored.clone())?;

        let index = self.record(
            txn_id,
            opts,
            id.clone(),
            TxnOp::InsertVertex {
                input: vertex,
                stored: stored.clone(),
            },
        );
        debug!(vertex = %id, txn = %txn_id, "vertex created");
        self.fan_out(
            opts,
            SyncMessage::AddNewVertex {
                txn_id,
                vertex: stored,
            },
        );
        Ok(MutationOutcome::new(OutcomeKind::Created, id, index))
    }

    /// Remove a vertex that has no incident edges.
    ///
    /// No cascade: outgoing edges are reported as `HasChildren`, incoming ones
    /// as `HasParents`.
    pub fn delete_vertex(
        &mut self,
        txn_id: TxnId,
        id: &VertexId,
        opts: &MutationOptions,
    ) -> MutationResult<MutationOutcome> {
        let id = self.ids.resolve_vertex(id);
        let vertex = self
            .graph
            .get_vertex(&id)
            .ok_or_else(|| MutationError::NotFound(id.clone()))?;

        if vertex.has_children() {
            let edges = vertex.out_edges().cloned().collect();
            return Err(MutationError::has_children(id, edges));
        }
        if vertex.has_parents() {
            let edges: Vec<_> = vertex.in_edges().cloned().collect();
            let parents: Vec<VertexId> = edges
                .iter()
                .filter_map(|e| self.graph.get_edge(e))
                .map(|e| e.start.clone())
                .collect();
            warn!(vertex = %id, ?parents, ?edges, "refusing to delete vertex with parents");
            return Err(MutationError::has_parents(id, parents, edges));
        }

        let original = self.graph.remove_vertex(&id)?;
        let index = self.record(txn_id, opts, id.clone(), TxnOp::DeleteVertex { original });
        debug!(vertex = %id, txn = %txn_id, "vertex deleted");
        self.fan_out(
            opts,
            SyncMessage::DeleteVertex {
                txn_id,
                vertex_id: id.clone(),
            },
        );
        Ok(MutationOutcome::new(OutcomeKind::Deleted, id, index))
    }
}
