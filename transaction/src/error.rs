//! Transaction error types.

use pagegraph_core::{Classify, ErrorClass, TxnId};
use thiserror::Error;

/// Transaction errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransactionError {
    /// No records were ever written under this id.
    #[error("unknown transaction: {0}")]
    UnknownTransaction(TxnId),

    /// Revert index outside the record list.
    #[error("revert index {index} out of range for {txn_id} ({len} records)")]
    IndexOutOfRange { txn_id: TxnId, index: i64, len: usize },
}

impl TransactionError {
    pub fn index_out_of_range(txn_id: TxnId, index: i64, len: usize) -> Self {
        Self::IndexOutOfRange { txn_id, index, len }
    }
}

impl Classify for TransactionError {
    fn class(&self) -> ErrorClass {
        ErrorClass::State
    }
}

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;
