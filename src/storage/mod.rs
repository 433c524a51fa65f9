//! Vocabulary Storage Module
//!
//! The key-value table the search engine reads from.
//!
//! ## Core Concepts
//! - **Primary table**: records keyed by `PK` (source language + word) and `SK`
//!   (target language + part of speech).
//! - **Reverse-lookup index**: `LKP` (target language + word) with `SRC_LANG` as range key,
//!   so one target word maps back to many source entries.
//! - **Canonical-word index**: a single-purpose index on `CanonicalWord`.
//! - **Access**: `VocabularyTable` is the read contract; `InMemoryTable` implements it.

pub mod memory;
pub mod table;

pub use memory::{InMemoryTable, TableOp};
pub use table::*;

#[cfg(test)]
mod tests;
