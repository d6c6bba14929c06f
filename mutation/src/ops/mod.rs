//! Primitive implementations.
//!
//! Each primitive resolves ids through the reconciliation map, validates,
//! writes the Store, records and fans out, in that order. Validation failures
//! leave all three untouched.

mod edge;
mod props;
mod rebind;
mod revert;
mod vertex;
