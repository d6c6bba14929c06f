//! Edge create/delete.

use pagegraph_core::{Edge, EdgeId, TxnId};
use pagegraph_sync::SyncMessage;
use pagegraph_transaction::TxnOp;
use tracing::debug;

use crate::error::{MutationError, MutationResult};
use crate::executor::MutationExecutor;
use crate::options::MutationOptions;
use crate::result::{MutationOutcome, OutcomeKind};
use crate::validation::validate_edge_id;

impl MutationExecutor<'_> {
    /// Add an edge between two existing vertices.
    ///
    /// The edge is appended to `S.OUT[T]` and `E.IN[T]`. Its id must be new
    /// and must not already sit in either bucket.
    pub fn create_edge(
        &mut self,
        txn_id: TxnId,
        edge: Edge,
        opts: &MutationOptions,
    ) -> MutationResult<MutationOutcome> {
        validate_edge_id(&edge.id)?;
        let id = self.ids.resolve_edge(&edge.id);
        let start = self.ids.resolve_vertex(&edge.start);
        let end = self.ids.resolve_vertex(&edge.end);

        let (start_vertex, end_vertex) = match (self.graph.get_vertex(&start), self.graph.get_vertex(&end)) {
            (Some(s), Some(e)) => (s, e),
            (None, _) => return Err(MutationError::invalid_edge(id, start)),
            (_, None) => return Err(MutationError::invalid_edge(id, end)),
        };
        let listed = start_vertex.out_of_type(&edge.edge_type).contains(&id)
            || end_vertex.in_of_type(&edge.edge_type).contains(&id);
        if listed || self.graph.contains_edge(&id) {
            return Err(MutationError::DuplicateEdge(id));
        }

        let stored = Edge {
            id: id.clone(),
            start,
            end,
            edge_type: edge.edge_type.clone(),
            props: edge.props.clone(),
        };
        self.graph.insert_edge(stored.clone())?;

        let index = self.record(
            txn_id,
            opts,
            id.clone(),
            TxnOp::InsertEdge {
                input: edge,
                stored: stored.clone(),
            },
        );
        debug!(edge = %id, start = %stored.start, end = %stored.end, txn = %txn_id, "edge created");
        self.fan_out(opts, SyncMessage::AddNewEdge { txn_id, edge: stored });
        Ok(MutationOutcome::new(OutcomeKind::Created, id, index))
    }

    /// Remove an edge from the Store and from both endpoints' buckets.
    pub fn delete_edge(
        &mut self,
        txn_id: TxnId,
        id: &EdgeId,
        opts: &MutationOptions,
    ) -> MutationResult<MutationOutcome> {
        let id = self.ids.resolve_edge(id);
        if !self.graph.contains_edge(&id) {
            return Err(MutationError::EdgeNotFound(id));
        }

        let removed = self.graph.remove_edge(&id)?;
        let index = self.record(
            txn_id,
            opts,
            id.clone(),
            TxnOp::DeleteEdge {
                original: removed.edge,
                out_position: removed.out_position,
                in_position: removed.in_position,
            },
        );
        debug!(edge = %id, txn = %txn_id, "edge deleted");
        self.fan_out(
            opts,
            SyncMessage::DeleteEdge {
                txn_id,
                edge_id: id.clone(),
            },
        );
        Ok(MutationOutcome::new(OutcomeKind::Deleted, id, index))
    }

    /// Put a deleted edge back at the bucket slots it held. Used by revert.
    pub(crate) fn restore_edge(
        &mut self,
        txn_id: TxnId,
        edge: Edge,
        out_position: usize,
        in_position: usize,
        opts: &MutationOptions,
    ) -> MutationResult<MutationOutcome> {
        let id = self.ids.resolve_edge(&edge.id);
        let mut stored = edge;
        stored.id = id.clone();
        stored.start = self.ids.resolve_vertex(&stored.start);
        stored.end = self.ids.resolve_vertex(&stored.end);

        for endpoint in [&stored.start, &stored.end] {
            if !self.graph.contains_vertex(endpoint) {
                return Err(MutationError::invalid_edge(id, endpoint.clone()));
            }
        }
        if self.graph.contains_edge(&id) {
            return Err(MutationError::DuplicateEdge(id));
        }

        self.graph
            .insert_edge_at(stored.clone(), Some(out_position), Some(in_position))?;
        let index = self.record(
            txn_id,
            opts,
            id.clone(),
            TxnOp::InsertEdge {
                input: stored.clone(),
                stored: stored.clone(),
            },
        );
        self.fan_out(opts, SyncMessage::AddNewEdge { txn_id, edge: stored });
        Ok(MutationOutcome::new(OutcomeKind::Created, id, index))
    }
}
