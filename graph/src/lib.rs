//! Pagegraph Store
//!
//! This crate provides the canonical in-memory container of the graph:
//! - Vertex and edge storage in wire shape (`IN`/`OUT` buckets kept in sync)
//! - Label index: find vertices by label
//! - Key-path change tracking with batching, so dependents of an unrelated
//!   path are never invalidated

mod changes;
mod error;
mod graph;
mod index;

pub use changes::{StorePath, SubscriptionId};
pub use error::{GraphError, GraphResult};
pub use graph::{Graph, GraphSnapshot, RemovedEdge};
pub use index::LabelIndex;
