//! Error types for the persistence layer.
//!
//! # Design
//! "Not found" is not an error here: lookups return `Option` and deletes
//! return `bool`. `InvalidInput` is kept apart from `Sql` because callers map
//! it to a client error rather than a server failure.

use thiserror::Error;

/// Errors returned by `TodoStore` operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying SQLite call failed.
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The request could not be turned into a statement, e.g. an update with
    /// no allow-listed field.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// A previous holder of the connection panicked.
    #[error("connection lock poisoned")]
    Poisoned,

    /// The call was dropped before it finished, e.g. during runtime shutdown.
    #[error("store call aborted")]
    Aborted,
}
