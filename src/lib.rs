//! Vocabulary Search Engine Library
//!
//! Resolves free-text queries into vocabulary entries stored in a key-value
//! table with secondary indexes. The binary (`main.rs`) wraps it in an HTTP API.
//!
//! ## Architecture Modules
//! - **`search`**: The query pipeline. Key construction, normalization, the concurrent
//!   strategy runner, the de-duplicating accumulator, the bounded fallback scan and
//!   the `SearchEngine` entry point.
//! - **`storage`**: The table read contract (`VocabularyTable`) and an in-memory
//!   implementation maintaining the primary table and both secondary indexes.
//! - **`config`**: Engine tunables loaded from the environment.
//! - **`error`**: Store and search error types.

pub mod config;
pub mod error;
pub mod search;
pub mod storage;
