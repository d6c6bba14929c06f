//! Pagegraph Core Types
//!
//! This crate provides the foundational types shared by every pagegraph crate:
//! - Identity types (VertexId, EdgeId, EntityId, TxnId, PeerId)
//! - Property bags (the `Props` map of JSON values and the `props!` macro)
//! - Entity structures (Vertex, Edge) in their wire shape
//! - The error classification shared by all error enums

mod entity;
mod error;
mod id;
mod value;

pub use entity::*;
pub use error::*;
pub use id::*;
pub use value::*;
