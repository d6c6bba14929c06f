//! Operation descriptors exchanged between peers.

use pagegraph_core::{Edge, EdgeId, PeerId, Props, TxnId, Vertex, VertexId};
use pagegraph_graph::GraphSnapshot;
use serde::{Deserialize, Serialize};

use crate::error::SyncResult;

/// One replayable primitive call. The JSON top-level key names the primitive:
///
/// ```json
/// {"addNewVertex": {"txnId": 5, "vertex": {"id": "-1", "L": ["Page"], "P": {}}}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SyncMessage {
    AddNewVertex {
        txn_id: TxnId,
        vertex: Vertex,
    },
    DeleteVertex {
        txn_id: TxnId,
        vertex_id: VertexId,
    },
    MergeVertexProperties {
        txn_id: TxnId,
        id: VertexId,
        props: Props,
    },
    /// Whole-bag replace of a vertex's properties.
    UpdateVertex {
        txn_id: TxnId,
        id: VertexId,
        props: Props,
    },
    UpdateVertexId {
        old_id: VertexId,
        new_id: VertexId,
    },
    AddNewEdge {
        txn_id: TxnId,
        edge: Edge,
    },
    DeleteEdge {
        txn_id: TxnId,
        edge_id: EdgeId,
    },
    /// Whole-bag replace of an edge's properties.
    UpdateEdge {
        txn_id: TxnId,
        id: EdgeId,
        props: Props,
    },
    UpdateEdgeId {
        old_id: EdgeId,
        new_id: EdgeId,
    },
    /// Full graph, sent once to a freshly joined peer.
    Snapshot(GraphSnapshot),
    /// Sent by a peer that joined with an empty store.
    RequestSnapshot,
}

impl SyncMessage {
    /// Name of the primitive, as used for the top-level JSON key.
    pub fn op_name(&self) -> &'static str {
        match self {
            SyncMessage::AddNewVertex { .. } => "addNewVertex",
            SyncMessage::DeleteVertex { .. } => "deleteVertex",
            SyncMessage::MergeVertexProperties { .. } => "mergeVertexProperties",
            SyncMessage::UpdateVertex { .. } => "updateVertex",
            SyncMessage::UpdateVertexId { .. } => "updateVertexId",
            SyncMessage::AddNewEdge { .. } => "addNewEdge",
            SyncMessage::DeleteEdge { .. } => "deleteEdge",
            SyncMessage::UpdateEdge { .. } => "updateEdge",
            SyncMessage::UpdateEdgeId { .. } => "updateEdgeId",
            SyncMessage::Snapshot(_) => "snapshot",
            SyncMessage::RequestSnapshot => "requestSnapshot",
        }
    }
}

/// A message plus routing metadata. The sender tag lives here, never inside
/// the payload.
///
/// `origin` and `seq` identify the operation across relays: `origin` is the
/// peer that first published it and `seq` counts that peer's publications.
/// A relay rewrites `sender` and keeps both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender: PeerId,
    pub origin: PeerId,
    pub seq: u64,
    pub message: SyncMessage,
}

impl Envelope {
    /// An envelope first published by `sender`.
    pub fn new(sender: PeerId, seq: u64, message: SyncMessage) -> Self {
        Self {
            origin: sender.clone(),
            sender,
            seq,
            message,
        }
    }

    /// Same operation, handed on by `relay`.
    pub fn relayed_by(&self, relay: PeerId) -> Self {
        Self {
            sender: relay,
            ..self.clone()
        }
    }

    /// Key that is unique per published operation.
    pub fn op_key(&self) -> (PeerId, u64) {
        (self.origin.clone(), self.seq)
    }

    /// Serialize for the wire.
    pub fn encode(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from the wire.
    pub fn decode(raw: &str) -> SyncResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
