//! Strategy Runner
//!
//! Fans a set of independent read strategies out onto the tokio runtime and
//! waits for all of them, or for the search context to finish.
//!
//! ## Failure policy
//! A strategy that errors, panics or is cut off by cancellation is logged and
//! counted, never returned. One broken index must not fail the whole search.
//! When the context finishes first, the remaining tasks are detached: they
//! complete their in-flight read but issue no further ones.

use super::accumulator::ResultAccumulator;
use super::context::SearchContext;
use super::types::VocabularyEntry;
use crate::error::StoreError;
use crate::storage::table::{KeyQuery, RangeCondition, Record, TableIndex, VocabularyTable};

use std::sync::Arc;
use tokio::task::JoinSet;

/// One access path into the table.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Primary table query by `PK`, optionally narrowed on `SK`.
    Primary {
        hash_key: String,
        range: Option<RangeCondition>,
    },
    /// Secondary index query by its hash key.
    Index { index: TableIndex, hash_key: String },
}

impl Strategy {
    pub fn primary(hash_key: String) -> Self {
        Strategy::Primary {
            hash_key,
            range: None,
        }
    }

    pub fn index(index: TableIndex, hash_key: String) -> Self {
        Strategy::Index { index, hash_key }
    }

    pub fn describe(&self) -> String {
        match self {
            Strategy::Primary { hash_key, range: None } => format!("primary {}", hash_key),
            Strategy::Primary {
                hash_key,
                range: Some(range),
            } => format!("primary {} {:?}", hash_key, range),
            Strategy::Index { index, hash_key } => format!("{} {}", index.name(), hash_key),
        }
    }

    /// Runs the read and feeds decoded entries into `acc`.
    ///
    /// Returns how many records were accepted by the accumulator.
    pub async fn execute(
        &self,
        table: &dyn VocabularyTable,
        ctx: &SearchContext,
        acc: &ResultAccumulator,
        limit: usize,
    ) -> Result<usize, StoreError> {
        if ctx.is_done() || acc.is_full(limit) {
            return Ok(0);
        }

        let records = match self {
            Strategy::Primary { hash_key, range } => {
                let mut query = KeyQuery::hash(hash_key.clone()).with_limit(limit);
                query.range = range.clone();
                table.query(query).await?
            }
            Strategy::Index { index, hash_key } => {
                let query = KeyQuery::hash(hash_key.clone()).with_limit(limit);
                table.query_index(*index, query).await?
            }
        };

        Ok(absorb(records, acc, limit))
    }
}

/// Decodes records into `acc` until it is full. Undecodable records are skipped.
pub(crate) fn absorb(records: Vec<Record>, acc: &ResultAccumulator, limit: usize) -> usize {
    let mut accepted = 0;
    for record in records {
        match VocabularyEntry::from_record(record) {
            Ok(entry) => {
                if !acc.try_add(entry, limit) {
                    break;
                }
                accepted += 1;
            }
            Err(e) => {
                tracing::warn!("Skipping malformed record: {}", e);
            }
        }
    }
    accepted
}

/// Outcome counters of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Strategies still running when the context finished.
    pub abandoned: usize,
}

pub struct StrategyRunner {
    table: Arc<dyn VocabularyTable>,
}

impl StrategyRunner {
    pub fn new(table: Arc<dyn VocabularyTable>) -> Self {
        Self { table }
    }

    /// Runs every strategy concurrently against the shared accumulator.
    pub async fn run(
        &self,
        ctx: &SearchContext,
        strategies: Vec<Strategy>,
        acc: Arc<ResultAccumulator>,
        limit: usize,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut tasks = JoinSet::new();

        for strategy in strategies {
            let table = self.table.clone();
            let ctx = ctx.clone();
            let acc = acc.clone();
            tasks.spawn(async move {
                let result = strategy.execute(table.as_ref(), &ctx, &acc, limit).await;
                (strategy, result)
            });
        }

        loop {
            tokio::select! {
                joined = tasks.join_next() => {
                    match joined {
                        Some(Ok((strategy, Ok(accepted)))) => {
                            tracing::debug!("Strategy {} accepted {} entries", strategy.describe(), accepted);
                            summary.succeeded += 1;
                        }
                        Some(Ok((strategy, Err(e)))) => {
                            tracing::warn!("Strategy {} failed: {}", strategy.describe(), e);
                            summary.failed += 1;
                        }
                        Some(Err(e)) => {
                            tracing::warn!("Strategy task did not complete: {}", e);
                            summary.failed += 1;
                        }
                        None => break,
                    }
                }
                _ = ctx.done() => {
                    summary.abandoned = tasks.len();
                    tracing::debug!("Search context finished, leaving {} strategies behind", summary.abandoned);
                    tasks.detach_all();
                    break;
                }
            }
        }

        summary
    }
}
