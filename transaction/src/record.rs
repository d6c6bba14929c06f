//! Transaction record types.

use pagegraph_core::{Edge, EntityId, Props, Value, Vertex};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// Value a property held before a merge touched it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriorValue {
    /// The key did not exist; undo removes it.
    Absent,
    /// The key held this value; undo writes it back.
    Present(Value),
}

impl PriorValue {
    pub fn from_option(value: Option<Value>) -> Self {
        match value {
            Some(v) => PriorValue::Present(v),
            None => PriorValue::Absent,
        }
    }

    /// JSON view, the absent sentinel rendered as `null`.
    pub fn to_json(&self) -> Value {
        match self {
            PriorValue::Absent => Value::Null,
            PriorValue::Present(v) => v.clone(),
        }
    }
}

/// The primitive a record was written by, with what it needs to be undone.
#[derive(Debug, Clone, PartialEq)]
pub enum TxnOp {
    /// A vertex was created.
    InsertVertex {
        /// The caller's input, before id remapping.
        input: Vertex,
        /// What was written to the Store.
        stored: Vertex,
    },

    /// A vertex was deleted.
    DeleteVertex { original: Vertex },

    /// Properties were merged into a vertex.
    MergeVertex {
        /// The partial bag that was merged.
        merged: Props,
        /// Previous values of exactly the merged keys.
        prior: BTreeMap<String, PriorValue>,
        /// The vertex after the merge.
        after: Vertex,
    },

    /// A vertex's property bag was replaced.
    ReplaceVertex {
        props: Props,
        original: Props,
        after: Vertex,
    },

    /// An edge was created.
    InsertEdge { input: Edge, stored: Edge },

    /// An edge was deleted, with the bucket slots it held.
    DeleteEdge {
        original: Edge,
        out_position: usize,
        in_position: usize,
    },

    /// An edge's property bag was replaced.
    ReplaceEdge {
        props: Props,
        original: Props,
        after: Edge,
    },
}

/// Kind tag of a [`TxnOp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpKind {
    InsertVertex,
    DeleteVertex,
    MergeVertex,
    ReplaceVertex,
    InsertEdge,
    DeleteEdge,
    ReplaceEdge,
}

/// One entry in a transaction's record list.
#[derive(Debug, Clone, PartialEq)]
pub struct TxnRecord {
    /// The (resolved) id of the entity the primitive touched.
    pub entity_id: EntityId,
    /// What happened.
    pub op: TxnOp,
}

impl TxnRecord {
    pub fn new(entity_id: impl Into<EntityId>, op: TxnOp) -> Self {
        Self {
            entity_id: entity_id.into(),
            op,
        }
    }

    /// Get the kind of this record.
    pub fn kind(&self) -> OpKind {
        match &self.op {
            TxnOp::InsertVertex { .. } => OpKind::InsertVertex,
            TxnOp::DeleteVertex { .. } => OpKind::DeleteVertex,
            TxnOp::MergeVertex { .. } => OpKind::MergeVertex,
            TxnOp::ReplaceVertex { .. } => OpKind::ReplaceVertex,
            TxnOp::InsertEdge { .. } => OpKind::InsertEdge,
            TxnOp::DeleteEdge { .. } => OpKind::DeleteEdge,
            TxnOp::ReplaceEdge { .. } => OpKind::ReplaceEdge,
        }
    }

    /// Check if this record touched a vertex.
    pub fn is_vertex_op(&self) -> bool {
        self.entity_id.is_vertex()
    }

    /// JSON view of the data the primitive wrote (`null` for deletes).
    pub fn new_data(&self) -> Value {
        match &self.op {
            TxnOp::InsertVertex { stored, .. } => to_json(stored),
            TxnOp::MergeVertex { merged, .. } => json!({ "P": merged }),
            TxnOp::ReplaceVertex { props, .. } | TxnOp::ReplaceEdge { props, .. } => {
                json!({ "P": props })
            }
            TxnOp::InsertEdge { stored, .. } => to_json(stored),
            TxnOp::DeleteVertex { .. } | TxnOp::DeleteEdge { .. } => Value::Null,
        }
    }

    /// JSON view of the data the inverse needs: the raw input for inserts,
    /// the deleted entity for deletes, the previous property values otherwise.
    pub fn original_data(&self) -> Value {
        match &self.op {
            TxnOp::InsertVertex { input, .. } => to_json(input),
            TxnOp::DeleteVertex { original } => to_json(original),
            TxnOp::MergeVertex { prior, .. } => {
                let props: serde_json::Map<String, Value> = prior
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                json!({ "P": props })
            }
            TxnOp::ReplaceVertex { original, .. } | TxnOp::ReplaceEdge { original, .. } => {
                json!({ "P": original })
            }
            TxnOp::InsertEdge { input, .. } => to_json(input),
            TxnOp::DeleteEdge { original, .. } => to_json(original),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
