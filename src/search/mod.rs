//! Vocabulary Search Module
//!
//! Resolves a free-text query into vocabulary entries using targeted index reads
//! first and a bounded table scan only when those under-deliver.
//!
//! ## Pipeline
//! `normalize` -> concurrent strategies -> accumulator -> optional fallback scan
//! -> drain truncated to the limit.
//!
//! ## Submodules
//! - **`engine`**: `SearchEngine`, the public entry point (free-text, hinted and batch lookups).
//! - **`runner`**: Concurrent fan-out of read strategies with best-effort failure handling.
//! - **`accumulator`**: Lock-guarded de-duplicating result map.
//! - **`fallback`**: Paginated, page-budgeted substring scan.
//! - **`keys`**: Primary, sort and index key construction.
//! - **`normalize`**: The word normalizer applied once per query.
//! - **`context`**: Cancellation and deadlines for one call.
//! - **`handlers`**: HTTP request handlers for the Axum web server.
//! - **`types`**: Entries and Data Transfer Objects (DTOs).

pub mod accumulator;
pub mod context;
pub mod engine;
pub mod fallback;
pub mod handlers;
pub mod keys;
pub mod normalize;
pub mod runner;
pub mod types;
