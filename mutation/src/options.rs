//! Per-call switches for the primitives.

use pagegraph_core::PeerId;

/// Controls the side effects of one primitive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOptions {
    /// Append a record to the transaction log.
    pub log: bool,
    /// Fan the operation out to peers.
    pub broadcast: bool,
    /// Peer that must not receive the fan-out (the one it came from).
    pub skip_broadcast_to: Option<PeerId>,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self::local()
    }
}

impl MutationOptions {
    /// An edit made in this context: logged and broadcast.
    pub fn local() -> Self {
        Self {
            log: true,
            broadcast: true,
            skip_broadcast_to: None,
        }
    }

    /// Replay of an operation received from `sender`. Not logged (undo only
    /// makes sense where the edit originated) and never re-published: a
    /// replay carries no origin, so relaying happens on the received
    /// envelope instead.
    pub fn remote(sender: PeerId) -> Self {
        Self {
            log: false,
            broadcast: false,
            skip_broadcast_to: Some(sender),
        }
    }

    /// Logged but kept local.
    pub fn silent() -> Self {
        Self {
            log: true,
            broadcast: false,
            skip_broadcast_to: None,
        }
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn with_broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast = broadcast;
        self
    }
}
