//! Mutation executor.

use pagegraph_core::{EntityId, TxnId};
use pagegraph_graph::Graph;
use pagegraph_sync::{Broadcast, SyncMessage};
use pagegraph_transaction::{TransactionLog, TxnOp, TxnRecord};
use tracing::debug;

use crate::error::MutationResult;
use crate::options::MutationOptions;
use crate::reconcile::IdMap;
use crate::result::MutationOutcome;

/// Executes primitives against a graph.
///
/// Borrows everything a primitive touches for the duration of one call
/// sequence. The primitives themselves live in `ops/`.
pub struct MutationExecutor<'a> {
    pub(crate) graph: &'a mut Graph,
    pub(crate) ids: &'a mut IdMap,
    pub(crate) log: &'a mut TransactionLog,
    pub(crate) channel: Option<&'a dyn Broadcast>,
}

impl<'a> MutationExecutor<'a> {
    /// Create a new executor. Without a channel nothing is broadcast.
    pub fn new(
        graph: &'a mut Graph,
        ids: &'a mut IdMap,
        log: &'a mut TransactionLog,
        channel: Option<&'a dyn Broadcast>,
    ) -> Self {
        Self {
            graph,
            ids,
            log,
            channel,
        }
    }

    pub fn graph(&self) -> &Graph {
        &*self.graph
    }

    pub fn ids(&self) -> &IdMap {
        &*self.ids
    }

    pub fn log(&self) -> &TransactionLog {
        &*self.log
    }

    /// Open a fresh transaction in the log.
    pub fn begin_transaction(&mut self) -> TxnId {
        self.log.begin()
    }

    /// Run `f` as one batch: Store listeners see its writes once, after it
    /// returns.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.graph.begin_batch();
        let result = f(self);
        self.graph.end_batch();
        result
    }

    /// Append a record unless logging is off. Returns the record's index.
    pub(crate) fn record(
        &mut self,
        txn_id: TxnId,
        opts: &MutationOptions,
        entity: impl Into<EntityId>,
        op: TxnOp,
    ) -> Option<usize> {
        if !opts.log {
            return None;
        }
        self.log.append(txn_id, TxnRecord::new(entity, op))
    }

    /// Publish to peers unless broadcasting is off.
    pub(crate) fn fan_out(&self, opts: &MutationOptions, message: SyncMessage) {
        if !opts.broadcast {
            return;
        }
        if let Some(channel) = self.channel {
            let delivered = channel.publish(&message, opts.skip_broadcast_to.as_ref());
            debug!(op = message.op_name(), delivered, "fanned out");
        }
    }

    /// Replay a primitive received from a peer.
    ///
    /// Snapshot traffic is not a primitive and yields `Ok(None)`; adopting or
    /// answering it is up to the owner of the store.
    pub fn apply_message(
        &mut self,
        message: SyncMessage,
        opts: &MutationOptions,
    ) -> MutationResult<Option<MutationOutcome>> {
        let outcome = match message {
            SyncMessage::AddNewVertex { txn_id, vertex } => {
                self.create_vertex(txn_id, vertex, opts)?
            }
            SyncMessage::DeleteVertex { txn_id, vertex_id } => {
                self.delete_vertex(txn_id, &vertex_id, opts)?
            }
            SyncMessage::MergeVertexProperties { txn_id, id, props } => {
                self.merge_vertex_properties(txn_id, &id, props, opts)?
            }
            SyncMessage::UpdateVertex { txn_id, id, props } => {
                self.replace_vertex_properties(txn_id, &id, props, opts)?
            }
            SyncMessage::UpdateVertexId { old_id, new_id } => {
                self.update_vertex_id(&old_id, &new_id, opts)?
            }
            SyncMessage::AddNewEdge { txn_id, edge } => self.create_edge(txn_id, edge, opts)?,
            SyncMessage::DeleteEdge { txn_id, edge_id } => {
                self.delete_edge(txn_id, &edge_id, opts)?
            }
            SyncMessage::UpdateEdge { txn_id, id, props } => {
                self.replace_edge_properties(txn_id, &id, props, opts)?
            }
            SyncMessage::UpdateEdgeId { old_id, new_id } => {
                self.update_edge_id(&old_id, &new_id, opts)?
            }
            SyncMessage::Snapshot(_) | SyncMessage::RequestSnapshot => return Ok(None),
        };
        Ok(Some(outcome))
    }
}
