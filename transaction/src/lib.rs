//! Pagegraph Transaction Log
//!
//! Per-session record of applied primitives.
//!
//! Responsibilities:
//! - Append one record per primitive, keyed by transaction id
//! - Keep enough original data to replay each record's inverse
//! - Materialize a transaction into the diff the persistence backend consumes
//! - Discard finished sessions and mint ids for new ones

mod diff;
mod error;
mod log;
mod record;

pub use diff::TxnDiff;
pub use error::{TransactionError, TransactionResult};
pub use log::TransactionLog;
pub use record::{OpKind, PriorValue, TxnOp, TxnRecord};
