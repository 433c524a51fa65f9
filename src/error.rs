//! Error types for the vocabulary search engine.
//!
//! Two layers exist: [`StoreError`] is what a [`VocabularyTable`](crate::storage::VocabularyTable)
//! reports for a single call, and [`SearchError`] is what crosses the engine's public
//! boundary. Most store errors never become a `SearchError`; strategy failures are
//! absorbed by the strategy runner and only logged.

use thiserror::Error;

/// Errors reported by a table implementation for a single call.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the request.
    #[error("Store transport error: {0}")]
    Transport(String),
    /// A record could not be decoded into a vocabulary entry.
    #[error("Failed to decode record: {0}")]
    Decode(String),
    /// A continuation token did not come from this table.
    #[error("Invalid continuation token: {0}")]
    InvalidToken(String),
    /// The caller's context finished before the store answered.
    #[error("Request cancelled before the store answered")]
    Cancelled,
    /// The record is missing its key attributes.
    #[error("Record is missing key attribute {0}")]
    MissingKey(&'static str),
}

/// Errors surfaced to callers of [`SearchEngine`](crate::search::engine::SearchEngine).
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query could not be normalized.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// A composite entry key could not be parsed.
    #[error("Invalid entry key: {0}")]
    InvalidKey(String),
    /// The batched multi-key read failed as a whole.
    #[error("Batch get of {requested} keys failed")]
    BatchGet {
        requested: usize,
        #[source]
        source: StoreError,
    },
}
