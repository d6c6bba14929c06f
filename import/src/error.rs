//! Import error types.

use pagegraph_core::{Classify, ErrorClass};
use pagegraph_mutation::MutationError;
use thiserror::Error;

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Errors that can occur while importing a fragment or applying a diff.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Fragment has no vertices to import")]
    EmptyFragment,

    #[error("Malformed fragment: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Mutation(#[from] MutationError),
}

impl Classify for ImportError {
    fn class(&self) -> ErrorClass {
        match self {
            ImportError::EmptyFragment | ImportError::Malformed(_) => ErrorClass::Validation,
            ImportError::Mutation(e) => e.class(),
        }
    }
}
