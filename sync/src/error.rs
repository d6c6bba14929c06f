//! Synchronization error types.

use pagegraph_core::{Classify, ErrorClass, PeerId};
use thiserror::Error;

/// Result type for channel operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur on a broadcast topic.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("peer already joined topic {topic}: {peer}")]
    PeerAlreadyJoined { topic: String, peer: PeerId },

    #[error("peer not on topic {topic}: {peer}")]
    UnknownPeer { topic: String, peer: PeerId },

    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl SyncError {
    pub fn peer_already_joined(topic: impl Into<String>, peer: PeerId) -> Self {
        Self::PeerAlreadyJoined {
            topic: topic.into(),
            peer,
        }
    }

    pub fn unknown_peer(topic: impl Into<String>, peer: PeerId) -> Self {
        Self::UnknownPeer {
            topic: topic.into(),
            peer,
        }
    }
}

impl Classify for SyncError {
    fn class(&self) -> ErrorClass {
        match self {
            SyncError::Malformed(_) => ErrorClass::Validation,
            SyncError::PeerAlreadyJoined { .. } | SyncError::UnknownPeer { .. } => {
                ErrorClass::State
            }
        }
    }
}
