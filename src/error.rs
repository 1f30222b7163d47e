//! Error types surfaced by the tables.

use thiserror::Error;

/// Table-level failures that are not tied to a particular resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The bucket array could not be reserved when the table was built.
    #[error("bucket array allocation failed")]
    OutOfMemory,
    /// Every identifier in a chronological table's range is in use.
    #[error("chronological id space exhausted")]
    IdSpaceExhausted,
}

/// Returned by `ResourceTable::add` when an equal identifier is already
/// installed. The rejected resource is handed back untouched.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum AddError<T> {
    #[error("identifier already installed")]
    DuplicateIdentifier(T),
}

impl<T> AddError<T> {
    /// Recover the resource that was not installed.
    pub fn into_inner(self) -> T {
        match self {
            AddError::DuplicateIdentifier(res) => res,
        }
    }
}

/// Returned by `ChronIdTable::add` when no identifier could be assigned.
#[derive(Debug, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ChronAddError<T> {
    pub kind: Error,
    pub resource: T,
}
