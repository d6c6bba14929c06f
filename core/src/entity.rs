//! Entity structures for pagegraph.
//!
//! Vertices and edges keep the wire shape the persistence backend and the
//! peer channel exchange: `{id, L, P, IN, OUT}` and `{id, S, E, T, P}`.

use crate::{EdgeId, Props, Value, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Edge-type name -> ids of the incident edges of that type.
pub type EdgeBuckets = BTreeMap<String, Vec<EdgeId>>;

/// A vertex in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Unique identifier for this vertex. May be left out where the id is
    /// the key of an enclosing map.
    #[serde(default)]
    pub id: VertexId,
    /// Labels, first one is the primary type.
    #[serde(rename = "L", default)]
    pub labels: Vec<String>,
    /// Property values.
    #[serde(rename = "P", default)]
    pub props: Props,
    /// Incoming edges (this vertex is the end), by edge type.
    #[serde(rename = "IN", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ins: EdgeBuckets,
    /// Outgoing edges (this vertex is the start), by edge type.
    #[serde(rename = "OUT", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outs: EdgeBuckets,
}

impl Vertex {
    /// Create a new vertex with no incident edges.
    pub fn new(id: impl Into<VertexId>, labels: Vec<String>, props: Props) -> Self {
        Self {
            id: id.into(),
            labels,
            props,
            ins: EdgeBuckets::new(),
            outs: EdgeBuckets::new(),
        }
    }

    /// The primary label, if any.
    pub fn primary_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// Returns true if the vertex carries the given label.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Get a property value by name.
    pub fn get_prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Returns true if any outgoing bucket is non-empty.
    pub fn has_children(&self) -> bool {
        self.outs.values().any(|ids| !ids.is_empty())
    }

    /// Returns true if any incoming bucket is non-empty.
    pub fn has_parents(&self) -> bool {
        self.ins.values().any(|ids| !ids.is_empty())
    }

    /// Ids of all incoming edges.
    pub fn in_edges(&self) -> impl Iterator<Item = &EdgeId> + '_ {
        self.ins.values().flatten()
    }

    /// Ids of all outgoing edges.
    pub fn out_edges(&self) -> impl Iterator<Item = &EdgeId> + '_ {
        self.outs.values().flatten()
    }

    /// Ids of the outgoing edges of one type.
    pub fn out_of_type(&self, edge_type: &str) -> &[EdgeId] {
        self.outs.get(edge_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of the incoming edges of one type.
    pub fn in_of_type(&self, edge_type: &str) -> &[EdgeId] {
        self.ins.get(edge_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A copy without adjacency, as stored in a transaction record or diff.
    pub fn detached(&self) -> Self {
        Self::new(self.id.clone(), self.labels.clone(), self.props.clone())
    }
}

/// A typed, directed edge between two vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier for this edge.
    #[serde(default)]
    pub id: EdgeId,
    /// Start vertex.
    #[serde(rename = "S")]
    pub start: VertexId,
    /// End vertex.
    #[serde(rename = "E")]
    pub end: VertexId,
    /// Edge type name.
    #[serde(rename = "T")]
    pub edge_type: String,
    /// Property values.
    #[serde(rename = "P", default)]
    pub props: Props,
}

impl Edge {
    /// Create a new edge.
    pub fn new(
        id: impl Into<EdgeId>,
        start: impl Into<VertexId>,
        end: impl Into<VertexId>,
        edge_type: impl Into<String>,
        props: Props,
    ) -> Self {
        Self {
            id: id.into(),
            start: start.into(),
            end: end.into(),
            edge_type: edge_type.into(),
            props,
        }
    }

    /// Get a property value by name.
    pub fn get_prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Check if this edge touches the given vertex at either end.
    pub fn involves(&self, vertex_id: &VertexId) -> bool {
        self.start == *vertex_id || self.end == *vertex_id
    }
}
