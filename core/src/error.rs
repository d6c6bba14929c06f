//! Error classification shared by every pagegraph error enum.

use std::fmt;

/// The three families of failure a pagegraph operation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Malformed input or an id that collides with an existing entity.
    Validation,
    /// A missing edge endpoint, or a delete blocked by live edges.
    Referential,
    /// Commit or revert against an unknown transaction, or a bad log index.
    State,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Validation => f.write_str("ValidationError"),
            ErrorClass::Referential => f.write_str("ReferentialError"),
            ErrorClass::State => f.write_str("StateError"),
        }
    }
}

/// Implemented by every error enum so callers can branch on the family
/// without matching each variant.
pub trait Classify {
    fn class(&self) -> ErrorClass;
}
