use super::accumulator::ResultAccumulator;
use super::context::SearchContext;
use super::fallback::FallbackScanner;
use super::keys::{build_primary_key, build_reverse_key, build_sort_key_prefix};
use super::normalize::Normalizer;
use super::runner::{Strategy, StrategyRunner};
use super::types::VocabularyEntry;
use crate::config::SearchConfig;
use crate::error::{SearchError, StoreError};
use crate::storage::table::{EntryKey, RangeCondition, TableIndex, VocabularyTable};

use std::collections::HashMap;
use std::sync::Arc;

/// Resolves free-text queries into vocabulary entries.
///
/// The engine only reads. Each call owns its own accumulator; nothing is
/// shared between searches except the table client.
pub struct SearchEngine {
    table: Arc<dyn VocabularyTable>,
    normalizer: Arc<dyn Normalizer>,
    runner: StrategyRunner,
    scanner: FallbackScanner,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(
        table: Arc<dyn VocabularyTable>,
        normalizer: Arc<dyn Normalizer>,
        config: SearchConfig,
    ) -> Self {
        Self {
            runner: StrategyRunner::new(table.clone()),
            scanner: FallbackScanner::new(
                table.clone(),
                config.scan_batch_size,
                config.scan_max_pages,
            ),
            table,
            normalizer,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Fans out over every supported language, then falls back to a bounded
    /// scan when the configured policy says the targeted reads under-delivered.
    pub async fn search_by_query(
        &self,
        ctx: &SearchContext,
        query: &str,
        supported_languages: &[String],
        limit: usize,
    ) -> Result<Vec<VocabularyEntry>, SearchError> {
        let normalized = self.normalizer.normalize(query)?;
        let limit = self.config.resolve_limit(limit);

        let mut strategies = Vec::with_capacity(supported_languages.len() * 2 + 1);
        for lang in supported_languages {
            strategies.push(Strategy::primary(build_primary_key(lang, &normalized)));
        }
        for lang in supported_languages {
            strategies.push(Strategy::index(
                TableIndex::ReverseLookup,
                build_reverse_key(lang, &normalized),
            ));
        }
        strategies.push(Strategy::index(TableIndex::CanonicalWord, normalized.clone()));

        let acc = Arc::new(ResultAccumulator::new());
        let summary = self.runner.run(ctx, strategies, acc.clone(), limit).await;
        let found = acc.len();
        tracing::debug!(
            "Targeted search for '{}' found {} entries ({:?})",
            normalized,
            found,
            summary
        );

        if self.config.fallback_policy.should_scan(found, limit) {
            tracing::info!(
                "Falling back to table scan for '{}' ({} of {} found)",
                normalized,
                found,
                limit
            );
            let outcome = self.scanner.scan(ctx, &normalized, &acc, limit).await;
            tracing::debug!("Fallback for '{}' finished ({:?})", normalized, outcome);
        }

        Ok(acc.drain(limit))
    }

    /// Uses the language hints to issue a single targeted read. Never scans:
    /// an empty result here is a true negative. Without any hint this is
    /// [`SearchEngine::search_by_query`] over the configured languages.
    pub async fn search_with_language_hints(
        &self,
        ctx: &SearchContext,
        query: &str,
        source_lang: Option<&str>,
        target_lang: Option<&str>,
        limit: usize,
    ) -> Result<Vec<VocabularyEntry>, SearchError> {
        let strategy = match (source_lang, target_lang) {
            (None, None) => {
                return self
                    .search_by_query(ctx, query, &self.config.supported_languages, limit)
                    .await;
            }
            (Some(source), Some(target)) => {
                let normalized = self.normalizer.normalize(query)?;
                Strategy::Primary {
                    hash_key: build_primary_key(source, &normalized),
                    range: Some(RangeCondition::BeginsWith(build_sort_key_prefix(target))),
                }
            }
            (None, Some(target)) => {
                let normalized = self.normalizer.normalize(query)?;
                Strategy::index(
                    TableIndex::ReverseLookup,
                    build_reverse_key(target, &normalized),
                )
            }
            (Some(source), None) => {
                let normalized = self.normalizer.normalize(query)?;
                Strategy::primary(build_primary_key(source, &normalized))
            }
        };

        let limit = self.config.resolve_limit(limit);
        let acc = Arc::new(ResultAccumulator::new());
        let summary = self.runner.run(ctx, vec![strategy], acc.clone(), limit).await;
        tracing::debug!("Targeted lookup finished ({:?})", summary);

        Ok(acc.drain(limit))
    }

    /// Fetches known entries in one batched read, keyed by `<PK>|<SK>`.
    ///
    /// Missing keys are absent from the map. A failure of the batch call itself,
    /// including the context finishing before it returns, is an error.
    pub async fn batch_get_by_keys(
        &self,
        ctx: &SearchContext,
        keys: &[EntryKey],
    ) -> Result<HashMap<String, VocabularyEntry>, SearchError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let result = tokio::select! {
            result = self.table.batch_get(keys) => result,
            _ = ctx.done() => Err(StoreError::Cancelled),
        };
        let records = result.map_err(|source| SearchError::BatchGet {
            requested: keys.len(),
            source,
        })?;

        let mut entries = HashMap::with_capacity(records.len());
        for record in records {
            match VocabularyEntry::from_record(record) {
                Ok(entry) => {
                    entries.insert(entry.key().to_string(), entry);
                }
                Err(e) => tracing::warn!("Skipping malformed batch record: {}", e),
            }
        }

        tracing::debug!("Batch get resolved {} of {} keys", entries.len(), keys.len());
        Ok(entries)
    }
}
