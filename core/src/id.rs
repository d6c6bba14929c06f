//! Identity types for pagegraph entities.
//!
//! Vertex and edge ids are opaque strings. Ids minted on the client before the
//! persistence backend confirms them are negative integers rendered as strings
//! (`"-1"`, `"-2"`, ...); confirmed ids can be any string.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a vertex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub String);

impl VertexId {
    /// Create a new VertexId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this id was minted on the client and not yet confirmed.
    pub fn is_client_minted(&self) -> bool {
        is_client_minted(&self.0)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VertexId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for VertexId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Unique identifier for an edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new EdgeId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this id was minted on the client and not yet confirmed.
    pub fn is_client_minted(&self) -> bool {
        is_client_minted(&self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

fn is_client_minted(raw: &str) -> bool {
    raw.strip_prefix('-')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Unified identifier that can refer to either a vertex or an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Vertex(VertexId),
    Edge(EdgeId),
}

impl EntityId {
    /// Returns true if this is a vertex ID.
    pub fn is_vertex(&self) -> bool {
        matches!(self, EntityId::Vertex(_))
    }

    /// Returns true if this is an edge ID.
    pub fn is_edge(&self) -> bool {
        matches!(self, EntityId::Edge(_))
    }

    /// Get as a VertexId if this is a vertex reference.
    pub fn as_vertex(&self) -> Option<&VertexId> {
        match self {
            EntityId::Vertex(id) => Some(id),
            EntityId::Edge(_) => None,
        }
    }

    /// Get as an EdgeId if this is an edge reference.
    pub fn as_edge(&self) -> Option<&EdgeId> {
        match self {
            EntityId::Vertex(_) => None,
            EntityId::Edge(id) => Some(id),
        }
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        match self {
            EntityId::Vertex(id) => id.as_str(),
            EntityId::Edge(id) => id.as_str(),
        }
    }
}

impl From<VertexId> for EntityId {
    fn from(id: VertexId) -> Self {
        EntityId::Vertex(id)
    }
}

impl From<EdgeId> for EntityId {
    fn from(id: EdgeId) -> Self {
        EntityId::Edge(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Vertex(id) => write!(f, "vertex {}", id),
            EntityId::Edge(id) => write!(f, "edge {}", id),
        }
    }
}

/// Identifier of a logical edit session in the transaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxnId(pub i64);

impl TxnId {
    /// Sentinel meaning "untracked, non-revertible": primitives called with it
    /// never write the transaction log.
    pub const UNTRACKED: TxnId = TxnId(-1);

    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }

    /// Returns true if this is the untracked sentinel.
    pub fn is_untracked(&self) -> bool {
        *self == Self::UNTRACKED
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn{}", self.0)
    }
}

/// Identifier of one rendering context on a broadcast topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
