//! Property merge and replace.

use pagegraph_core::{EdgeId, Props, TxnId, VertexId};
use pagegraph_sync::SyncMessage;
use pagegraph_transaction::{PriorValue, TxnOp};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{MutationError, MutationResult};
use crate::executor::MutationExecutor;
use crate::options::MutationOptions;
use crate::result::{MutationOutcome, OutcomeKind};

impl MutationExecutor<'_> {
    /// Overwrite the keys of `partial` on a vertex, leaving other keys alone.
    ///
    /// The record keeps the previous value of exactly the merged keys, with
    /// keys that did not exist marked absent.
    pub fn merge_vertex_properties(
        &mut self,
        txn_id: TxnId,
        id: &VertexId,
        partial: Props,
        opts: &MutationOptions,
    ) -> MutationResult<MutationOutcome> {
        let id = self.ids.resolve_vertex(id);
        let vertex = self
            .graph
            .get_vertex(&id)
            .ok_or_else(|| MutationError::NotFound(id.clone()))?;

        let prior: BTreeMap<String, PriorValue> = partial
            .keys()
            .map(|key| (key.clone(), PriorValue::from_option(vertex.get_prop(key).cloned())))
            .collect();

        let written = partial.clone();
        self.graph.batch(|graph| {
            for (key, value) in written {
                graph.set_vertex_prop(&id, &key, value)?;
            }
            Ok::<_, MutationError>(())
        })?;

        let after = match self.graph.get_vertex(&id) {
            Some(vertex) => vertex.detached(),
            None => return Err(MutationError::NotFound(id)),
        };
        let index = self.record(
            txn_id,
            opts,
            id.clone(),
            TxnOp::MergeVertex {
                merged: partial.clone(),
                prior,
                after,
            },
        );
        debug!(vertex = %id, txn = %txn_id, keys = partial.len(), "vertex properties merged");
        self.fan_out(
            opts,
            SyncMessage::MergeVertexProperties {
                txn_id,
                id: id.clone(),
                props: partial,
            },
        );
        Ok(MutationOutcome::new(OutcomeKind::Updated, id, index))
    }

    /// Swap a vertex's whole property bag.
    pub fn replace_vertex_properties(
        &mut self,
        txn_id: TxnId,
        id: &VertexId,
        props: Props,
        opts: &MutationOptions,
    ) -> MutationResult<MutationOutcome> {
        let id = self.ids.resolve_vertex(id);
        if !self.graph.contains_vertex(&id) {
            return Err(MutationError::NotFound(id));
        }

        let original = self.graph.replace_vertex_props(&id, props.clone())?;
        let after = match self.graph.get_vertex(&id) {
            Some(vertex) => vertex.detached(),
            None => return Err(MutationError::NotFound(id)),
        };
        let index = self.record(
            txn_id,
            opts,
            id.clone(),
            TxnOp::ReplaceVertex {
                props: props.clone(),
                original,
                after,
            },
        );
        debug!(vertex = %id, txn = %txn_id, "vertex properties replaced");
        self.fan_out(
            opts,
            SyncMessage::UpdateVertex {
                txn_id,
                id: id.clone(),
                props,
            },
        );
        Ok(MutationOutcome::new(OutcomeKind::Updated, id, index))
    }

    /// Swap an edge's whole property bag.
    pub fn replace_edge_properties(
        &mut self,
        txn_id: TxnId,
        id: &EdgeId,
        props: Props,
        opts: &MutationOptions,
    ) -> MutationResult<MutationOutcome> {
        let id = self.ids.resolve_edge(id);
        if !self.graph.contains_edge(&id) {
            return Err(MutationError::EdgeNotFound(id));
        }

        let original = self.graph.replace_edge_props(&id, props.clone())?;
        let after = match self.graph.get_edge(&id) {
            Some(edge) => edge.clone(),
            None => return Err(MutationError::EdgeNotFound(id)),
        };
        let index = self.record(
            txn_id,
            opts,
            id.clone(),
            TxnOp::ReplaceEdge {
                props: props.clone(),
                original,
                after,
            },
        );
        debug!(edge = %id, txn = %txn_id, "edge properties replaced");
        self.fan_out(
            opts,
            SyncMessage::UpdateEdge {
                txn_id,
                id: id.clone(),
                props,
            },
        );
        Ok(MutationOutcome::new(OutcomeKind::Updated, id, index))
    }
}
