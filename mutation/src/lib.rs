//! Pagegraph Mutation
//!
//! The only write path into the Store.
//!
//! Responsibilities:
//! - Resolve every incoming id through the reconciliation map first
//! - Enforce referential integrity (no dangling edges, unique ids, no cascade)
//! - Record each applied primitive in the transaction log
//! - Fan each applied primitive out to peer contexts
//! - Replay a transaction's inverse to revert it
//!
//! # Module Structure
//!
//! - `executor` - MutationExecutor, shared bookkeeping and remote replay
//! - `ops/` - Individual primitives (vertex, props, edge, rebind, revert)
//! - `reconcile` - Id reconciliation map and client id minting
//! - `validation` - Id checks run before the Store is touched
//! - `options` - Per-call logging/broadcast switches
//! - `error` - Error types for mutation failures
//! - `result` - Result types for mutation outcomes

mod error;
mod executor;
mod ops;
mod options;
mod reconcile;
mod result;
mod validation;

pub use error::{MutationError, MutationResult};
pub use executor::MutationExecutor;
pub use options::MutationOptions;
pub use reconcile::{IdAllocator, IdMap};
pub use result::{MutationOutcome, OutcomeKind};
