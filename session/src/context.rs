//! Graph context.

use pagegraph_core::{Edge, EdgeId, PeerId, Props, TxnId, Vertex, VertexId};
use pagegraph_graph::{Graph, GraphSnapshot, StorePath, SubscriptionId};
use pagegraph_import::{apply_diff, DiffOptions, DiffReport, Fragment, ImportOutcome, StructuralImporter};
use pagegraph_mutation::{
    IdAllocator, IdMap, MutationExecutor, MutationOptions, MutationOutcome,
};
use pagegraph_sync::{Broadcast, Envelope, PeerEndpoint, SyncMessage, SyncTopic};
use pagegraph_transaction::{TransactionLog, TxnDiff};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::ContextConfig;
use crate::error::{SessionError, SessionResult};
use crate::result::ReceiveStats;

/// One rendering context.
///
/// Owns a full copy of the graph. Every write goes through the mutation
/// primitives, so it is logged under its transaction and fanned out to the
/// peers on the joined topic. Peers' operations arrive through
/// [`GraphContext::receive`].
#[derive(Debug)]
pub struct GraphContext {
    config: ContextConfig,
    peer_id: PeerId,
    graph: Graph,
    ids: IdMap,
    log: TransactionLog,
    alloc: IdAllocator,
    importer: StructuralImporter,
    endpoint: Option<PeerEndpoint>,
    snapshot_adopted: bool,
    /// Set while a snapshot request is outstanding.
    awaiting_snapshot: bool,
    /// Peer operations that arrived before the requested snapshot.
    held: Vec<Envelope>,
    /// `(origin, seq)` of every peer operation handled on this topic.
    seen: HashSet<(PeerId, u64)>,
}

impl GraphContext {
    /// Create a context with an empty graph.
    pub fn new(config: ContextConfig) -> Self {
        Self::with_graph(config, Graph::new())
    }

    /// Create a context around an existing graph.
    pub fn with_graph(config: ContextConfig, graph: Graph) -> Self {
        Self {
            peer_id: config.peer(),
            importer: StructuralImporter::new(config.import.clone()),
            config,
            graph,
            ids: IdMap::new(),
            log: TransactionLog::new(),
            alloc: IdAllocator::new(),
            endpoint: None,
            snapshot_adopted: false,
            awaiting_snapshot: false,
            held: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn ids(&self) -> &IdMap {
        &self.ids
    }

    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    fn executor(&mut self) -> MutationExecutor<'_> {
        let channel = self.endpoint.as_ref().map(|e| e as &dyn Broadcast);
        MutationExecutor::new(&mut self.graph, &mut self.ids, &mut self.log, channel)
    }

    // ==================== Peers ====================

    /// Join a topic. An empty context asks the others for a snapshot and
    /// holds their operations until one arrives; a populated one offers its
    /// own when `send_snapshot_on_join` is set.
    pub fn connect(&mut self, topic: &SyncTopic) -> SessionResult<()> {
        let endpoint = topic.join(self.peer_id.clone())?;
        info!(peer = %self.peer_id, topic = topic.name(), "context joined topic");

        if self.graph.is_empty() {
            let asked = endpoint.publish(&SyncMessage::RequestSnapshot, None);
            self.awaiting_snapshot = asked > 0;
        } else if self.config.send_snapshot_on_join {
            endpoint.publish(&SyncMessage::Snapshot(self.graph.snapshot()), None);
        }
        self.endpoint = Some(endpoint);
        Ok(())
    }

    /// Leave the joined topic, if any. Operations still held for a snapshot
    /// are dropped.
    pub fn disconnect(&mut self) {
        if self.endpoint.take().is_some() {
            info!(peer = %self.peer_id, held = self.held.len(), "context left topic");
        }
        self.awaiting_snapshot = false;
        self.held.clear();
        self.seen.clear();
    }

    /// True between asking for a snapshot and adopting one.
    pub fn is_awaiting_snapshot(&self) -> bool {
        self.awaiting_snapshot
    }

    pub fn is_connected(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Send the whole graph to one peer.
    pub fn send_snapshot(&self, to: &PeerId) -> SessionResult<()> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or_else(|| SessionError::not_connected(self.peer_id.as_str()))?;
        endpoint.send_to(to, &SyncMessage::Snapshot(self.graph.snapshot()))?;
        debug!(peer = %self.peer_id, to = %to, "snapshot sent");
        Ok(())
    }

    /// Apply everything waiting in the inbox.
    ///
    /// Received operations replay through the same primitives without being
    /// logged or re-published. With `relay_remote_ops` set, each applied
    /// operation is forwarded as received to every peer but its sender; the
    /// `(origin, seq)` key drops any copy that comes round again. A replayed
    /// create counts as a duplicate; other refusals are collected, not
    /// returned.
    ///
    /// While a requested snapshot is outstanding, operations are held. On
    /// adoption, those from the snapshot's sender are dropped (the snapshot
    /// already reflects them) and the rest are applied.
    pub fn receive(&mut self) -> ReceiveStats {
        let mut stats = ReceiveStats::default();
        let Some(endpoint) = self.endpoint.as_ref() else {
            return stats;
        };
        let inbox = endpoint.drain();

        self.graph.begin_batch();
        for delivered in inbox {
            let envelope = match delivered {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(peer = %self.peer_id, error = %e, "dropping malformed peer message");
                    stats.malformed += 1;
                    continue;
                }
            };
            match envelope.message {
                SyncMessage::Snapshot(snapshot) => {
                    self.adopt_snapshot(&envelope.sender, snapshot, &mut stats)
                }
                SyncMessage::RequestSnapshot => self.answer_snapshot_request(&envelope.sender, &mut stats),
                _ => self.receive_operation(envelope, &mut stats),
            }
        }
        self.graph.end_batch();
        stats
    }

    fn adopt_snapshot(&mut self, sender: &PeerId, snapshot: GraphSnapshot, stats: &mut ReceiveStats) {
        if self.snapshot_adopted || !(self.awaiting_snapshot || self.graph.is_empty()) {
            stats.snapshots_ignored += 1;
            return;
        }
        self.graph.load_snapshot(snapshot);
        self.snapshot_adopted = true;
        self.awaiting_snapshot = false;
        stats.snapshots_adopted += 1;
        info!(
            peer = %self.peer_id,
            from = %sender,
            vertices = self.graph.vertex_count(),
            held = self.held.len(),
            "snapshot adopted"
        );

        for envelope in std::mem::take(&mut self.held) {
            if envelope.sender == *sender {
                stats.superseded += 1;
            } else {
                self.apply_remote(envelope, stats);
            }
        }
    }

    fn answer_snapshot_request(&mut self, sender: &PeerId, stats: &mut ReceiveStats) {
        if self.awaiting_snapshot {
            debug!(peer = %self.peer_id, from = %sender, "snapshot request left to settled peers");
            return;
        }
        match self.send_snapshot(sender) {
            Ok(()) => stats.snapshots_sent += 1,
            Err(e) => warn!(to = %sender, error = %e, "snapshot not sent"),
        }
    }

    fn receive_operation(&mut self, envelope: Envelope, stats: &mut ReceiveStats) {
        if envelope.origin == self.peer_id || !self.seen.insert(envelope.op_key()) {
            debug!(
                from = %envelope.sender,
                origin = %envelope.origin,
                seq = envelope.seq,
                "operation already seen"
            );
            stats.duplicates += 1;
            return;
        }
        if self.awaiting_snapshot {
            stats.held += 1;
            self.held.push(envelope);
            return;
        }
        self.apply_remote(envelope, stats);
    }

    fn apply_remote(&mut self, envelope: Envelope, stats: &mut ReceiveStats) {
        let sender = envelope.sender.clone();
        let opts = MutationOptions::remote(sender.clone()).with_log(self.config.log_remote_ops);
        let op = envelope.message.op_name();
        let result = self.executor().apply_message(envelope.message.clone(), &opts);
        match result {
            Ok(_) => {
                stats.applied += 1;
                if self.config.relay_remote_ops {
                    if let Some(endpoint) = self.endpoint.as_ref() {
                        let delivered = endpoint.forward(&envelope, Some(&sender));
                        debug!(peer = %self.peer_id, op, delivered, "operation relayed");
                    }
                }
            }
            Err(e) if e.is_duplicate() => {
                debug!(from = %sender, op, "replayed operation ignored");
                stats.duplicates += 1;
            }
            Err(e) => {
                warn!(from = %sender, op, error = %e, "peer operation rejected");
                stats.rejected.push((sender, e));
            }
        }
    }

    // ==================== Primitives ====================

    pub fn create_vertex(&mut self, txn_id: TxnId, vertex: Vertex) -> SessionResult<MutationOutcome> {
        Ok(self
            .executor()
            .create_vertex(txn_id, vertex, &MutationOptions::local())?)
    }

    pub fn delete_vertex(&mut self, txn_id: TxnId, id: &VertexId) -> SessionResult<MutationOutcome> {
        Ok(self
            .executor()
            .delete_vertex(txn_id, id, &MutationOptions::local())?)
    }

    pub fn merge_vertex_properties(
        &mut self,
        txn_id: TxnId,
        id: &VertexId,
        props: Props,
    ) -> SessionResult<MutationOutcome> {
        Ok(self
            .executor()
            .merge_vertex_properties(txn_id, id, props, &MutationOptions::local())?)
    }

    pub fn replace_vertex_properties(
        &mut self,
        txn_id: TxnId,
        id: &VertexId,
        props: Props,
    ) -> SessionResult<MutationOutcome> {
        Ok(self
            .executor()
            .replace_vertex_properties(txn_id, id, props, &MutationOptions::local())?)
    }

    pub fn update_vertex_id(&mut self, old_id: &VertexId, new_id: &VertexId) -> SessionResult<MutationOutcome> {
        Ok(self
            .executor()
            .update_vertex_id(old_id, new_id, &MutationOptions::local())?)
    }

    pub fn create_edge(&mut self, txn_id: TxnId, edge: Edge) -> SessionResult<MutationOutcome> {
        Ok(self
            .executor()
            .create_edge(txn_id, edge, &MutationOptions::local())?)
    }

    pub fn delete_edge(&mut self, txn_id: TxnId, id: &EdgeId) -> SessionResult<MutationOutcome> {
        Ok(self
            .executor()
            .delete_edge(txn_id, id, &MutationOptions::local())?)
    }

    pub fn replace_edge_properties(
        &mut self,
        txn_id: TxnId,
        id: &EdgeId,
        props: Props,
    ) -> SessionResult<MutationOutcome> {
        Ok(self
            .executor()
            .replace_edge_properties(txn_id, id, props, &MutationOptions::local())?)
    }

    pub fn update_edge_id(&mut self, old_id: &EdgeId, new_id: &EdgeId) -> SessionResult<MutationOutcome> {
        Ok(self
            .executor()
            .update_edge_id(old_id, new_id, &MutationOptions::local())?)
    }

    /// Mint a provisional vertex id not used by anything in this context.
    pub fn next_vertex_id(&mut self) -> VertexId {
        self.alloc.next_vertex_id(&self.graph, &self.ids)
    }

    /// Mint a provisional edge id not used by anything in this context.
    pub fn next_edge_id(&mut self) -> EdgeId {
        self.alloc.next_edge_id(&self.graph, &self.ids)
    }

    // ==================== Transactions ====================

    pub fn begin_transaction(&mut self) -> TxnId {
        self.log.begin()
    }

    /// The diff to hand to the persistence backend. Leaves the Store and the
    /// log as they are.
    pub fn commit(&self, txn_id: TxnId) -> SessionResult<TxnDiff> {
        Ok(self.log.commit(txn_id)?)
    }

    /// Undo the records of `txn_id` after `index` (`-1` for all of them).
    pub fn revert_transaction_up_to_index(&mut self, txn_id: TxnId, index: i64) -> SessionResult<usize> {
        Ok(self.executor().revert_transaction_up_to_index(txn_id, index)?)
    }

    /// Forget a transaction's records without undoing them.
    pub fn discard(&mut self, txn_id: TxnId) -> SessionResult<usize> {
        Ok(self.log.discard(txn_id)?.len())
    }

    /// Drop a finished transaction and open the next one.
    pub fn remove_txn_id_and_create_new(&mut self, txn_id: TxnId) -> TxnId {
        self.log.remove_txn_id_and_create_new(txn_id)
    }

    /// Adopt server-assigned ids: each `(provisional, confirmed)` pair is
    /// installed in the reconciliation map and the stored entity, if any, is
    /// re-keyed. Returns the number of entities re-keyed.
    pub fn confirm_ids<I, K, V>(&mut self, pairs: I) -> SessionResult<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let opts = MutationOptions::local();
        let renamed = self.executor().batch(|exec| {
            let mut renamed = 0usize;
            for (old, new) in pairs {
                let (old, new): (String, String) = (old.into(), new.into());
                let current = exec.ids().resolve(&old);
                if exec.graph().contains_edge(&EdgeId::new(current.as_str())) {
                    exec.update_edge_id(&EdgeId::new(old), &EdgeId::new(new), &opts)?;
                    renamed += 1;
                } else {
                    let stored = exec.graph().contains_vertex(&VertexId::new(current.as_str()));
                    exec.update_vertex_id(&VertexId::new(old), &VertexId::new(new), &opts)?;
                    if stored {
                        renamed += 1;
                    }
                }
            }
            Ok::<_, SessionError>(renamed)
        })?;
        info!(peer = %self.peer_id, renamed, "server ids confirmed");
        Ok(renamed)
    }

    // ==================== Bulk ====================

    /// Instantiate a fragment under a fresh transaction.
    pub fn import(
        &mut self,
        fragment: &Fragment,
        seed: &BTreeMap<String, VertexId>,
        attach_to: Option<(VertexId, String)>,
    ) -> SessionResult<ImportOutcome> {
        let channel = self.endpoint.as_ref().map(|e| e as &dyn Broadcast);
        let mut exec = MutationExecutor::new(&mut self.graph, &mut self.ids, &mut self.log, channel);
        Ok(self.importer.import(
            &mut exec,
            &mut self.alloc,
            fragment,
            seed,
            attach_to,
            &MutationOptions::local(),
        )?)
    }

    /// Converge onto a server-shaped diff under `txn_id`.
    pub fn apply_diff(&mut self, txn_id: TxnId, diff: &TxnDiff, options: DiffOptions) -> SessionResult<DiffReport> {
        let mut exec = self.executor();
        Ok(apply_diff(&mut exec, txn_id, diff, options, &MutationOptions::local())?)
    }

    // ==================== Change Tracking ====================

    /// Run `f` with Store notifications held until it returns.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.graph.begin_batch();
        let result = f(self);
        self.graph.end_batch();
        result
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&[StorePath]) + 'static,
    {
        self.graph.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.graph.unsubscribe(id)
    }

    pub fn revision(&self, path: &StorePath) -> u64 {
        self.graph.revision(path)
    }
}
