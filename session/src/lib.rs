//! Pagegraph Session
//!
//! One rendering context: a full copy of the graph together with its
//! transaction log, reconciliation map and peer endpoint.
//!
//! # Module Structure
//!
//! - `context` - GraphContext, the surface the rest of an application uses
//! - `config` - ContextConfig, loadable from TOML
//! - `scope` - Layered key lookup (ScopeChain)
//! - `result` - ReceiveStats
//! - `error` - Error types

mod config;
mod context;
mod error;
mod result;
mod scope;

pub use config::ContextConfig;
pub use context::GraphContext;
pub use error::{SessionError, SessionResult};
pub use result::ReceiveStats;
pub use scope::ScopeChain;
