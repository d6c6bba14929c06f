//! In-memory transaction log.

use pagegraph_core::TxnId;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::diff::TxnDiff;
use crate::error::{TransactionError, TransactionResult};
use crate::record::TxnRecord;

/// Ordered records per transaction id.
///
/// This is a per-session undo stack: nothing here is durable. Records written
/// under [`TxnId::UNTRACKED`] are dropped.
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    /// Records by transaction.
    txns: HashMap<TxnId, Vec<TxnRecord>>,
    /// Next transaction ID handed out by `begin`.
    next_txn_id: i64,
}

impl TransactionLog {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self {
            txns: HashMap::new(),
            next_txn_id: 1,
        }
    }

    /// Allocate a fresh transaction ID and open an empty record list for it.
    pub fn begin(&mut self) -> TxnId {
        let id = self.alloc_txn_id();
        self.txns.insert(id, Vec::new());
        debug!(txn = %id, "transaction opened");
        id
    }

    fn alloc_txn_id(&mut self) -> TxnId {
        let mut id = TxnId::new(self.next_txn_id.max(1));
        while self.txns.contains_key(&id) || id.is_untracked() {
            id = TxnId::new(id.raw() + 1);
        }
        self.next_txn_id = id.raw() + 1;
        id
    }

    /// Append a record. Returns its index, or `None` for the untracked id.
    ///
    /// Writing under an id that was never opened opens it.
    pub fn append(&mut self, txn_id: TxnId, record: TxnRecord) -> Option<usize> {
        if txn_id.is_untracked() {
            return None;
        }
        if txn_id.raw() >= self.next_txn_id {
            self.next_txn_id = txn_id.raw() + 1;
        }
        let records = self.txns.entry(txn_id).or_default();
        records.push(record);
        Some(records.len() - 1)
    }

    /// Check if records exist (or were opened) under this id.
    pub fn contains(&self, txn_id: TxnId) -> bool {
        self.txns.contains_key(&txn_id)
    }

    /// Get the ordered records of a transaction.
    pub fn records(&self, txn_id: TxnId) -> Option<&[TxnRecord]> {
        self.txns.get(&txn_id).map(Vec::as_slice)
    }

    /// Number of records under this id (0 if unknown).
    pub fn len(&self, txn_id: TxnId) -> usize {
        self.txns.get(&txn_id).map_or(0, Vec::len)
    }

    /// Check if no transactions are tracked.
    pub fn is_empty(&self) -> bool {
        self.txns.is_empty()
    }

    /// Take the last record of a transaction off the log.
    pub fn pop(&mut self, txn_id: TxnId) -> Option<TxnRecord> {
        self.txns.get_mut(&txn_id).and_then(Vec::pop)
    }

    /// Ids of every tracked transaction, ascending.
    pub fn txn_ids(&self) -> Vec<TxnId> {
        let mut ids: Vec<TxnId> = self.txns.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Materialize a transaction into the diff the persistence backend
    /// consumes. Leaves the log untouched.
    pub fn commit(&self, txn_id: TxnId) -> TransactionResult<TxnDiff> {
        let records = self
            .txns
            .get(&txn_id)
            .ok_or(TransactionError::UnknownTransaction(txn_id))?;
        let diff = TxnDiff::from_records(records);
        info!(
            txn = %txn_id,
            records = records.len(),
            vertexes = diff.vertexes.len(),
            edges = diff.edges.len(),
            deleted_vertexes = diff.deleted_vertexes.len(),
            deleted_edges = diff.deleted_edges.len(),
            "transaction committed to diff"
        );
        Ok(diff)
    }

    /// Drop a transaction's records, returning them.
    pub fn discard(&mut self, txn_id: TxnId) -> TransactionResult<Vec<TxnRecord>> {
        let records = self
            .txns
            .remove(&txn_id)
            .ok_or(TransactionError::UnknownTransaction(txn_id))?;
        info!(txn = %txn_id, records = records.len(), "transaction discarded");
        Ok(records)
    }

    /// Discard a finished session's log (if any) and open the next one.
    pub fn remove_txn_id_and_create_new(&mut self, txn_id: TxnId) -> TxnId {
        if self.txns.remove(&txn_id).is_some() {
            info!(txn = %txn_id, "transaction discarded");
        }
        self.begin()
    }

    /// Clear the log (for testing).
    pub fn clear(&mut self) {
        self.txns.clear();
    }
}
