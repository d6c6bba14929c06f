//! Pagegraph Import
//!
//! Bulk ways of getting state into the Store, both built on the mutation
//! primitives so the result is logged, broadcast and revertible.
//!
//! # Module Structure
//!
//! - `fragment` - Statically authored `{vertexes, edges}` input
//! - `layout` - Structural labels and relations the importer targets
//! - `importer` - StructuralImporter
//! - `diff` - Bulk diff applier (server-shaped upserts and deletes)
//! - `error` - Error types

mod diff;
mod error;
mod fragment;
mod importer;
mod layout;

pub use diff::{apply_diff, DiffOptions, DiffReport};
pub use error::{ImportError, ImportResult};
pub use fragment::{Collection, Fragment};
pub use importer::{ImportOutcome, StructuralImporter};
pub use layout::ImportLayout;
