//! Transaction revert.

use pagegraph_core::{Props, TxnId};
use pagegraph_transaction::{PriorValue, TransactionError, TxnOp, TxnRecord};
use tracing::{info, warn};

use crate::error::{MutationError, MutationResult};
use crate::executor::MutationExecutor;
use crate::options::MutationOptions;
use crate::result::MutationOutcome;

impl MutationExecutor<'_> {
    /// Undo every record of `txn_id` after `index`, newest first.
    ///
    /// `-1` undoes the whole transaction; an index at or past the end is a
    /// no-op. Each undone record is removed from the log. The inverse writes
    /// are broadcast (peers did see the forward writes) but not logged.
    /// Listeners see the whole revert as one change.
    ///
    /// Returns the number of records undone. If an inverse fails, the record
    /// it came from stays in the log and the error is returned.
    pub fn revert_transaction_up_to_index(
        &mut self,
        txn_id: TxnId,
        index: i64,
    ) -> MutationResult<usize> {
        if !self.log.contains(txn_id) {
            return Err(TransactionError::UnknownTransaction(txn_id).into());
        }
        if index < -1 {
            let len = self.log.len(txn_id);
            return Err(TransactionError::index_out_of_range(txn_id, index, len).into());
        }

        let keep = usize::try_from(index + 1).unwrap_or(0);
        let opts = MutationOptions::local().with_log(false);
        let reverted = self.batch(|exec| {
            let mut reverted = 0usize;
            while exec.log.len(txn_id) > keep {
                let Some(record) = exec.log.pop(txn_id) else {
                    break;
                };
                if let Err(e) = exec.apply_inverse(txn_id, &record, &opts) {
                    warn!(txn = %txn_id, entity = %record.entity_id, error = %e, "revert stopped");
                    exec.log.append(txn_id, record);
                    return Err(e);
                }
                reverted += 1;
            }
            Ok(reverted)
        })?;

        info!(txn = %txn_id, reverted, kept = keep, "transaction reverted");
        Ok(reverted)
    }

    fn apply_inverse(
        &mut self,
        txn_id: TxnId,
        record: &TxnRecord,
        opts: &MutationOptions,
    ) -> MutationResult<MutationOutcome> {
        match &record.op {
            TxnOp::InsertVertex { stored, .. } => self.delete_vertex(txn_id, &stored.id, opts),
            TxnOp::DeleteVertex { original } => {
                self.create_vertex(txn_id, original.detached(), opts)
            }
            TxnOp::MergeVertex { prior, after, .. } => {
                let id = self.ids.resolve_vertex(&after.id);
                let mut props: Props = match self.graph.get_vertex(&id) {
                    Some(vertex) => vertex.props.clone(),
                    None => return Err(MutationError::NotFound(id)),
                };
                for (key, value) in prior {
                    match value {
                        PriorValue::Present(v) => {
                            props.insert(key.clone(), v.clone());
                        }
                        PriorValue::Absent => {
                            props.remove(key);
                        }
                    }
                }
                self.replace_vertex_properties(txn_id, &id, props, opts)
            }
            TxnOp::ReplaceVertex {
                original, after, ..
            } => self.replace_vertex_properties(txn_id, &after.id, original.clone(), opts),
            TxnOp::InsertEdge { stored, .. } => self.delete_edge(txn_id, &stored.id, opts),
            TxnOp::DeleteEdge {
                original,
                out_position,
                in_position,
            } => self.restore_edge(txn_id, original.clone(), *out_position, *in_position, opts),
            TxnOp::ReplaceEdge {
                original, after, ..
            } => self.replace_edge_properties(txn_id, &after.id, original.clone(), opts),
        }
    }
}
