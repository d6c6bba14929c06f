//! Result types for session operations.

use pagegraph_core::PeerId;
use pagegraph_mutation::MutationError;

/// Tally of one [`GraphContext::receive`](crate::GraphContext::receive) call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiveStats {
    /// Operations applied to the Store.
    pub applied: usize,
    /// Creates that had already been applied (replayed delivery).
    pub duplicates: usize,
    /// Operations the Store refused, with the peer that sent them.
    pub rejected: Vec<(PeerId, MutationError)>,
    /// Payloads that could not be decoded.
    pub malformed: usize,
    /// Operations queued behind an outstanding snapshot request.
    pub held: usize,
    /// Held operations dropped because the adopted snapshot came from their
    /// sender.
    pub superseded: usize,
    pub snapshots_adopted: usize,
    pub snapshots_ignored: usize,
    pub snapshots_sent: usize,
}

impl ReceiveStats {
    /// Messages handled in total.
    pub fn total(&self) -> usize {
        self.applied
            + self.duplicates
            + self.rejected.len()
            + self.malformed
            + self.held
            + self.superseded
            + self.snapshots_adopted
            + self.snapshots_ignored
            + self.snapshots_sent
    }
}
