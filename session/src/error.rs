//! Session error types.

use pagegraph_core::{Classify, ErrorClass};
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Mutation error.
    #[error("mutation error: {0}")]
    Mutation(#[from] pagegraph_mutation::MutationError),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(#[from] pagegraph_transaction::TransactionError),

    /// Import or diff error.
    #[error("import error: {0}")]
    Import(#[from] pagegraph_import::ImportError),

    /// Channel error.
    #[error("sync error: {0}")]
    Sync(#[from] pagegraph_sync::SyncError),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// The context has not joined a topic.
    #[error("context {peer} is not connected")]
    NotConnected { peer: String },
}

impl SessionError {
    pub fn not_connected(peer: impl Into<String>) -> Self {
        Self::NotConnected { peer: peer.into() }
    }
}

impl Classify for SessionError {
    fn class(&self) -> ErrorClass {
        match self {
            SessionError::Mutation(e) => e.class(),
            SessionError::Transaction(e) => e.class(),
            SessionError::Import(e) => e.class(),
            SessionError::Sync(e) => e.class(),
            SessionError::Config(_) => ErrorClass::Validation,
            SessionError::NotConnected { .. } => ErrorClass::State,
        }
    }
}
