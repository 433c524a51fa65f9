//! Table Access Contract
//!
//! Describes the read surface the search engine needs from a key-value store
//! with secondary indexes. Records travel as raw attribute maps; decoding into
//! entries happens in the search layer.

use crate::error::StoreError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw store record: attribute name to JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

// --- Attribute names ---

/// Hash key of the primary table.
pub const ATTR_PK: &str = "PK";
/// Range key of the primary table.
pub const ATTR_SK: &str = "SK";
/// Hash key of the reverse-lookup index.
pub const ATTR_LOOKUP_KEY: &str = "LKP";
/// Range key of the reverse-lookup index.
pub const ATTR_SOURCE_PARTITION: &str = "SRC_LANG";
/// Hash key of the canonical-word index.
pub const ATTR_CANONICAL_WORD: &str = "CanonicalWord";
pub const ATTR_SOURCE_WORD: &str = "SourceWord";
pub const ATTR_TARGET_WORD: &str = "TargetWord";
/// Folded forms of the word fields, what substring scans compare against.
pub const ATTR_NORMALIZED_SOURCE_WORD: &str = "NormalizedSourceWord";
pub const ATTR_NORMALIZED_TARGET_WORD: &str = "NormalizedTargetWord";

/// Identity of one vocabulary record: `(PrimaryKey, SortKey)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryKey {
    pub pk: String,
    pub sk: String,
}

impl EntryKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    /// Reads the key attributes out of a raw record.
    pub fn from_record(record: &Record) -> Result<Self, StoreError> {
        let pk = record
            .get(ATTR_PK)
            .and_then(|v| v.as_str())
            .ok_or(StoreError::MissingKey(ATTR_PK))?;
        let sk = record
            .get(ATTR_SK)
            .and_then(|v| v.as_str())
            .ok_or(StoreError::MissingKey(ATTR_SK))?;
        Ok(Self::new(pk, sk))
    }
}

/// Composite form `<PK>|<SK>`, used as the key of batch lookup results.
impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.pk, self.sk)
    }
}

/// Secondary indexes maintained over the vocabulary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableIndex {
    /// Hash `LKP`, range `SRC_LANG`.
    ReverseLookup,
    /// Hash `CanonicalWord`, no range key.
    CanonicalWord,
}

impl TableIndex {
    pub fn name(&self) -> &'static str {
        match self {
            TableIndex::ReverseLookup => "ReverseLookupIndex",
            TableIndex::CanonicalWord => "CanonicalWordIndex",
        }
    }
}

/// Predicate on the range key of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeCondition {
    Equals(String),
    BeginsWith(String),
}

impl RangeCondition {
    pub fn matches(&self, range_key: &str) -> bool {
        match self {
            RangeCondition::Equals(value) => range_key == value,
            RangeCondition::BeginsWith(prefix) => range_key.starts_with(prefix.as_str()),
        }
    }
}

/// A hash-key query, optionally narrowed by a range predicate.
#[derive(Debug, Clone)]
pub struct KeyQuery {
    pub hash_key: String,
    pub range: Option<RangeCondition>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl KeyQuery {
    pub fn hash(hash_key: impl Into<String>) -> Self {
        Self {
            hash_key: hash_key.into(),
            range: None,
            limit: None,
        }
    }

    pub fn with_range(mut self, range: RangeCondition) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Server-side scan filter: any of `fields` contains `needle` as a substring.
#[derive(Debug, Clone)]
pub struct ContainsFilter {
    pub fields: Vec<&'static str>,
    pub needle: String,
}

impl ContainsFilter {
    pub fn matches(&self, record: &Record) -> bool {
        self.fields.iter().any(|field| {
            record
                .get(*field)
                .and_then(|v| v.as_str())
                .is_some_and(|value| value.contains(self.needle.as_str()))
        })
    }
}

/// Opaque pagination cursor returned by [`VocabularyTable::scan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken(pub String);

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub filter: Option<ContainsFilter>,
    /// Records evaluated for this page, before the filter applies.
    pub batch_size: usize,
    pub start: Option<ContinuationToken>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub records: Vec<Record>,
    /// `None` once the table has been fully scanned.
    pub next: Option<ContinuationToken>,
}

/// Read access to the vocabulary table and its indexes.
///
/// Implementations must be safe to share between concurrent strategies. Secondary
/// indexes are projections that may lag the primary table.
#[async_trait]
pub trait VocabularyTable: Send + Sync {
    /// Queries the primary table by `PK`, with an optional `SK` predicate.
    async fn query(&self, query: KeyQuery) -> Result<Vec<Record>, StoreError>;

    /// Queries a named secondary index by its hash key.
    async fn query_index(&self, index: TableIndex, query: KeyQuery)
        -> Result<Vec<Record>, StoreError>;

    /// Reads one page of a filtered full-table scan.
    async fn scan(&self, request: ScanRequest) -> Result<ScanPage, StoreError>;

    /// Fetches many records by identity. Missing keys are simply absent.
    async fn batch_get(&self, keys: &[EntryKey]) -> Result<Vec<Record>, StoreError>;
}
