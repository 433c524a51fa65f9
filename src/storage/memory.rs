//! In-Memory Vocabulary Table
//!
//! A [`VocabularyTable`] held entirely in process memory. Rows are grouped by
//! hash key with range keys kept sorted, and both secondary indexes are
//! maintained as projections pointing back at primary rows.
//!
//! Besides serving the binary, the table carries per-operation call counters,
//! fault injection and artificial latency so tests can observe which access
//! paths a search used.

use super::table::*;
use crate::error::StoreError;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Table operations, used to count calls and inject faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableOp {
    Query,
    Index(TableIndex),
    Scan,
    BatchGet,
}

#[derive(Default)]
pub struct InMemoryTable {
    /// Structure: `PK -> SK -> Record`.
    rows: DashMap<String, BTreeMap<String, Record>>,
    /// Structure: `LKP -> {(SRC_LANG, EntryKey)}`.
    reverse_index: DashMap<String, BTreeSet<(String, EntryKey)>>,
    /// Structure: `CanonicalWord -> {EntryKey}`.
    canonical_index: DashMap<String, BTreeSet<EntryKey>>,
    calls: DashMap<TableOp, usize>,
    /// Structure: `op -> (calls allowed before failing, message)`.
    faults: DashMap<TableOp, (usize, String)>,
    latency_ms: AtomicU64,
}

impl InMemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from serializable entries.
    pub fn from_entries<T: Serialize>(entries: &[T]) -> Result<Self, StoreError> {
        let table = Self::new();
        for entry in entries {
            table.put(entry)?;
        }
        Ok(table)
    }

    /// Serializes `entry` into a record and stores it.
    pub fn put<T: Serialize>(&self, entry: &T) -> Result<(), StoreError> {
        match serde_json::to_value(entry) {
            Ok(serde_json::Value::Object(record)) => self.put_record(record),
            Ok(other) => Err(StoreError::Decode(format!(
                "expected an object, got {}",
                other
            ))),
            Err(e) => Err(StoreError::Decode(e.to_string())),
        }
    }

    /// Stores a raw record, replacing any record with the same identity and
    /// refreshing its index projections.
    pub fn put_record(&self, record: Record) -> Result<(), StoreError> {
        let key = EntryKey::from_record(&record)?;

        let previous = self
            .rows
            .entry(key.pk.clone())
            .or_default()
            .insert(key.sk.clone(), record.clone());
        if let Some(previous) = previous {
            self.unindex(&key, &previous);
        }
        self.index(&key, &record);

        Ok(())
    }

    /// Drops a primary row but leaves its index projections behind, the way a
    /// lagging secondary index looks to a reader.
    pub fn evict_primary_row(&self, key: &EntryKey) -> bool {
        match self.rows.get_mut(&key.pk) {
            Some(mut by_sort) => by_sort.remove(&key.sk).is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes every subsequent call of `op` fail with a transport error.
    pub fn fail(&self, op: TableOp, message: &str) {
        self.fail_after(op, 0, message);
    }

    /// Lets the next `allowed` calls of `op` succeed, then fails every later one.
    pub fn fail_after(&self, op: TableOp, allowed: usize, message: &str) {
        let allowed = self.call_count(op) + allowed;
        self.faults.insert(op, (allowed, message.to_string()));
    }

    pub fn heal(&self, op: TableOp) {
        self.faults.remove(&op);
    }

    /// Delays every call by `latency` before it touches any data.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms.load(Ordering::SeqCst))
    }

    pub fn call_count(&self, op: TableOp) -> usize {
        self.calls.get(&op).map(|count| *count).unwrap_or(0)
    }

    fn index(&self, key: &EntryKey, record: &Record) {
        if let Some(lookup) = str_attr(record, ATTR_LOOKUP_KEY) {
            let partition = str_attr(record, ATTR_SOURCE_PARTITION).unwrap_or_default();
            self.reverse_index
                .entry(lookup.to_string())
                .or_default()
                .insert((partition.to_string(), key.clone()));
        }
        if let Some(word) = str_attr(record, ATTR_CANONICAL_WORD) {
            self.canonical_index
                .entry(word.to_string())
                .or_default()
                .insert(key.clone());
        }
    }

    fn unindex(&self, key: &EntryKey, record: &Record) {
        if let Some(lookup) = str_attr(record, ATTR_LOOKUP_KEY)
            && let Some(mut projected) = self.reverse_index.get_mut(lookup)
        {
            projected.retain(|(_, projected_key)| projected_key != key);
        }
        if let Some(word) = str_attr(record, ATTR_CANONICAL_WORD)
            && let Some(mut projected) = self.canonical_index.get_mut(word)
        {
            projected.remove(key);
        }
    }

    /// Counts the call, applies latency, then reports any injected fault.
    async fn enter(&self, op: TableOp) -> Result<(), StoreError> {
        let count = {
            let mut calls = self.calls.entry(op).or_insert(0);
            *calls += 1;
            *calls
        };

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if let Some(fault) = self.faults.get(&op) {
            let (allowed, message) = fault.value();
            if count > *allowed {
                return Err(StoreError::Transport(message.clone()));
            }
        }
        Ok(())
    }

    fn get_row(&self, key: &EntryKey) -> Option<Record> {
        self.rows
            .get(&key.pk)
            .and_then(|by_sort| by_sort.get(&key.sk).cloned())
    }

    fn sorted_keys(&self) -> Vec<EntryKey> {
        let mut keys: Vec<EntryKey> = self
            .rows
            .iter()
            .flat_map(|entry| {
                let pk = entry.key().clone();
                entry
                    .value()
                    .keys()
                    .map(|sk| EntryKey::new(pk.clone(), sk.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl VocabularyTable for InMemoryTable {
    async fn query(&self, query: KeyQuery) -> Result<Vec<Record>, StoreError> {
        self.enter(TableOp::Query).await?;

        let limit = query.limit.unwrap_or(usize::MAX);
        let records = match self.rows.get(&query.hash_key) {
            Some(by_sort) => by_sort
                .iter()
                .filter(|(sk, _)| query.range.as_ref().is_none_or(|range| range.matches(sk)))
                .take(limit)
                .map(|(_, record)| record.clone())
                .collect(),
            None => Vec::new(),
        };

        tracing::trace!("query {} -> {} records", query.hash_key, records.len());
        Ok(records)
    }

    async fn query_index(
        &self,
        index: TableIndex,
        query: KeyQuery,
    ) -> Result<Vec<Record>, StoreError> {
        self.enter(TableOp::Index(index)).await?;

        let keys: Vec<EntryKey> = match index {
            TableIndex::ReverseLookup => self
                .reverse_index
                .get(&query.hash_key)
                .map(|projected| {
                    projected
                        .iter()
                        .filter(|(partition, _)| {
                            query.range.as_ref().is_none_or(|range| range.matches(partition))
                        })
                        .map(|(_, key)| key.clone())
                        .collect()
                })
                .unwrap_or_default(),
            TableIndex::CanonicalWord => self
                .canonical_index
                .get(&query.hash_key)
                .map(|projected| projected.iter().cloned().collect())
                .unwrap_or_default(),
        };

        let limit = query.limit.unwrap_or(usize::MAX);
        // Projections whose primary row is gone are skipped.
        let records: Vec<Record> = keys
            .iter()
            .filter_map(|key| self.get_row(key))
            .take(limit)
            .collect();

        tracing::trace!(
            "{} {} -> {} records",
            index.name(),
            query.hash_key,
            records.len()
        );
        Ok(records)
    }

    async fn scan(&self, request: ScanRequest) -> Result<ScanPage, StoreError> {
        self.enter(TableOp::Scan).await?;

        let start_after = match &request.start {
            Some(token) => Some(parse_token(token)?),
            None => None,
        };

        let keys = self.sorted_keys();
        let first = match &start_after {
            Some(after) => keys.partition_point(|key| key <= after),
            None => 0,
        };
        let batch_size = request.batch_size.max(1);
        let evaluated = &keys[first..keys.len().min(first.saturating_add(batch_size))];

        let records = evaluated
            .iter()
            .filter_map(|key| self.get_row(key))
            .filter(|record| request.filter.as_ref().is_none_or(|f| f.matches(record)))
            .collect();

        let next = if first + evaluated.len() < keys.len() {
            evaluated
                .last()
                .map(|last| ContinuationToken(last.to_string()))
        } else {
            None
        };

        Ok(ScanPage { records, next })
    }

    async fn batch_get(&self, keys: &[EntryKey]) -> Result<Vec<Record>, StoreError> {
        self.enter(TableOp::BatchGet).await?;

        Ok(keys.iter().filter_map(|key| self.get_row(key)).collect())
    }
}

fn str_attr<'a>(record: &'a Record, name: &str) -> Option<&'a str> {
    record.get(name).and_then(|v| v.as_str())
}

fn parse_token(token: &ContinuationToken) -> Result<EntryKey, StoreError> {
    token
        .0
        .rsplit_once('|')
        .map(|(pk, sk)| EntryKey::new(pk, sk))
        .ok_or_else(|| StoreError::InvalidToken(token.0.clone()))
}
