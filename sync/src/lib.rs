//! Pagegraph Synchronization Channel
//!
//! Keeps several rendering contexts that show one graph consistent by fanning
//! out an operation stream between them.
//!
//! - `message` - the operation descriptors, one variant per primitive
//! - `topic` - per-session broadcast topics and the peer endpoints joined to them
//! - `error` - error types for channel failures
//!
//! Contexts never share memory: each one holds a full copy of the graph and
//! replays the messages it receives through its own primitives.

mod error;
mod message;
mod topic;

pub use error::{SyncError, SyncResult};
pub use message::{Envelope, SyncMessage};
pub use topic::{Broadcast, BroadcastHub, PeerEndpoint, SyncTopic};
