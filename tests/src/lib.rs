//! Shared fixtures for the pagegraph integration tests.
//!
//! Everything a scenario needs is re-exported from [`prelude`].

use pagegraph_core::{Props, Vertex};
use pagegraph_session::{ContextConfig, GraphContext, SessionResult};
use pagegraph_sync::SyncTopic;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub mod prelude {
    pub use crate::{connected, init_tracing, labeled, settle};
    pub use pagegraph_core::{props, Edge, EdgeId, PeerId, Props, TxnId, Value, Vertex, VertexId};
    pub use pagegraph_graph::{Graph, GraphSnapshot, StorePath};
    pub use pagegraph_import::{DiffOptions, Fragment};
    pub use pagegraph_mutation::MutationError;
    pub use pagegraph_session::{ContextConfig, GraphContext, ReceiveStats, SessionError};
    pub use pagegraph_sync::{Broadcast, Envelope, SyncMessage, SyncTopic};
    pub use pagegraph_transaction::TxnDiff;
}

/// Install a test subscriber once. Output is controlled by `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

/// One context per peer id, each joined to `topic` in order, with the
/// snapshot handshake run to completion.
pub fn connected(
    topic: &SyncTopic,
    peers: &[&str],
    configure: impl Fn(ContextConfig) -> ContextConfig,
) -> SessionResult<Vec<GraphContext>> {
    let mut contexts = peers
        .iter()
        .map(|peer| {
            let mut ctx = GraphContext::new(configure(ContextConfig::new(*peer)));
            ctx.connect(topic)?;
            Ok(ctx)
        })
        .collect::<SessionResult<Vec<_>>>()?;
    settle(&mut contexts);
    Ok(contexts)
}

/// Let every context receive until a full round handles nothing. Returns
/// the number of rounds that did work.
pub fn settle(contexts: &mut [GraphContext]) -> usize {
    const MAX_ROUNDS: usize = 16;
    for round in 0..MAX_ROUNDS {
        let handled: usize = contexts.iter_mut().map(|ctx| ctx.receive().total()).sum();
        if handled == 0 {
            return round;
        }
    }
    panic!("peers still exchanging messages after {MAX_ROUNDS} rounds");
}

/// A vertex with one label.
pub fn labeled(id: &str, label: &str, props: Props) -> Vertex {
    Vertex::new(id, vec![label.to_string()], props)
}
