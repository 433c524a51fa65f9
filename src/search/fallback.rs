//! Fallback Scanner
//!
//! Bounded, paginated full-table scan used when the targeted strategies come
//! up short. A substring match on the word fields cannot be served by any
//! index, so the scan is capped by a page budget instead of running to the end
//! of a large table.

use super::accumulator::ResultAccumulator;
use super::context::SearchContext;
use super::runner::absorb;
use crate::storage::table::{
    ATTR_NORMALIZED_SOURCE_WORD, ATTR_NORMALIZED_TARGET_WORD, ATTR_SOURCE_WORD,
    ATTR_TARGET_WORD, ContainsFilter, ScanRequest, VocabularyTable,
};

use std::sync::Arc;

/// Why a fallback scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop {
    /// The accumulator reached the requested limit.
    LimitReached,
    /// The store reported no further continuation token.
    TableExhausted,
    /// The page budget ran out first.
    PageBudget,
    Cancelled,
    /// A page read failed; what was accumulated so far stands.
    StoreError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOutcome {
    pub pages_read: usize,
    pub accepted: usize,
    pub stop: ScanStop,
}

pub struct FallbackScanner {
    table: Arc<dyn VocabularyTable>,
    batch_size: usize,
    max_pages: usize,
}

impl FallbackScanner {
    pub fn new(table: Arc<dyn VocabularyTable>, batch_size: usize, max_pages: usize) -> Self {
        Self {
            table,
            batch_size,
            max_pages,
        }
    }

    /// Scans for entries whose source or target word contains `needle`.
    ///
    /// `needle` is expected in normalized form. Records written without the
    /// normalized word attributes still match on their raw words.
    pub async fn scan(
        &self,
        ctx: &SearchContext,
        needle: &str,
        acc: &ResultAccumulator,
        limit: usize,
    ) -> ScanOutcome {
        let filter = ContainsFilter {
            fields: vec![
                ATTR_NORMALIZED_SOURCE_WORD,
                ATTR_NORMALIZED_TARGET_WORD,
                ATTR_SOURCE_WORD,
                ATTR_TARGET_WORD,
            ],
            needle: needle.to_string(),
        };

        let mut pages_read = 0;
        let mut accepted = 0;
        let mut start = None;

        let stop = loop {
            if acc.is_full(limit) {
                break ScanStop::LimitReached;
            }
            if pages_read >= self.max_pages {
                break ScanStop::PageBudget;
            }
            if ctx.is_done() {
                break ScanStop::Cancelled;
            }

            let request = ScanRequest {
                filter: Some(filter.clone()),
                batch_size: self.batch_size,
                start: start.take(),
            };
            let page = match self.table.scan(request).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Fallback scan page {} failed: {}", pages_read + 1, e);
                    break ScanStop::StoreError;
                }
            };
            pages_read += 1;
            accepted += absorb(page.records, acc, limit);

            match page.next {
                Some(token) => start = Some(token),
                None => {
                    break if acc.is_full(limit) {
                        ScanStop::LimitReached
                    } else {
                        ScanStop::TableExhausted
                    };
                }
            }
        };

        tracing::info!(
            "Fallback scan for '{}' read {} pages, accepted {} entries ({:?})",
            needle,
            pages_read,
            accepted,
            stop
        );

        ScanOutcome {
            pages_read,
            accepted,
            stop,
        }
    }
}
