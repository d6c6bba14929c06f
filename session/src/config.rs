//! Context configuration.

use pagegraph_core::PeerId;
use pagegraph_import::ImportLayout;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SessionResult;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

fn generated_peer_id() -> String {
    format!("ctx-{}", NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
}

/// Settings for one [`GraphContext`](crate::GraphContext).
///
/// Every field has a default, so a TOML file only names what it changes:
///
/// ```toml
/// peer_id = "host"
/// log_remote_ops = false
///
/// [import]
/// parent_label = "Section"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Channel id of this context.
    pub peer_id: String,
    /// Record operations received from peers in the local undo log.
    pub log_remote_ops: bool,
    /// Forward received operations to the other peers (never back to the
    /// sender). Only needed when peers are not all on one topic.
    pub relay_remote_ops: bool,
    /// Offer a snapshot to the topic when joining with a populated store.
    /// Explicit requests are answered either way.
    pub send_snapshot_on_join: bool,
    /// Shape of imported fragments.
    pub import: ImportLayout,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            peer_id: generated_peer_id(),
            log_remote_ops: false,
            relay_remote_ops: false,
            send_snapshot_on_join: true,
            import: ImportLayout::default(),
        }
    }
}

impl ContextConfig {
    pub fn new(peer_id: impl Into<String>) -> Self {
        Self::default().with_peer_id(peer_id)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> SessionResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn with_peer_id(mut self, peer_id: impl Into<String>) -> Self {
        self.peer_id = peer_id.into();
        self
    }

    pub fn with_log_remote_ops(mut self, enabled: bool) -> Self {
        self.log_remote_ops = enabled;
        self
    }

    pub fn with_relay_remote_ops(mut self, enabled: bool) -> Self {
        self.relay_remote_ops = enabled;
        self
    }

    pub fn with_send_snapshot_on_join(mut self, enabled: bool) -> Self {
        self.send_snapshot_on_join = enabled;
        self
    }

    pub fn with_import_layout(mut self, layout: ImportLayout) -> Self {
        self.import = layout;
        self
    }

    pub fn peer(&self) -> PeerId {
        PeerId::new(self.peer_id.as_str())
    }
}
