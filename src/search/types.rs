use super::keys::{build_primary_key, build_reverse_key, build_sort_key, build_source_partition};
use super::normalize::Normalizer;
use crate::error::{SearchError, StoreError};
use crate::storage::table::{EntryKey, Record};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A source/target example sentence pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExampleSentence {
    pub source: String,
    pub target: String,
}

/// The searchable unit, as stored in the vocabulary table.
///
/// `pk`, `sk`, `lookup_key` and `source_partition` are always derived from the
/// language codes, normalized words and part of speech; build new entries
/// through [`EntryDraft`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VocabularyEntry {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    #[serde(rename = "LKP", default, skip_serializing_if = "Option::is_none")]
    pub lookup_key: Option<String>,
    #[serde(rename = "SRC_LANG", default, skip_serializing_if = "Option::is_none")]
    pub source_partition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_word: Option<String>,

    pub source_word: String,
    pub target_word: String,
    /// `source_word` as the normalizer folds it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_source_word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_target_word: Option<String>,
    pub source_language: String,
    pub target_language: String,
    pub part_of_speech: String,
    #[serde(default)]
    pub definitions: Vec<String>,
    #[serde(default)]
    pub examples: Vec<ExampleSentence>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(rename = "PronunciationURL", default, skip_serializing_if = "Option::is_none")]
    pub pronunciation_url: Option<String>,
    #[serde(rename = "MediaURLs", default)]
    pub media_urls: Vec<String>,
    /// Free-form conjugation tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conjugations: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl VocabularyEntry {
    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.pk.clone(), self.sk.clone())
    }

    /// Decodes a raw record. Pure mapping, no I/O.
    pub fn from_record(record: Record) -> Result<Self, StoreError> {
        serde_json::from_value(serde_json::Value::Object(record))
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Entry content before its keys exist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EntryDraft {
    pub source_word: String,
    pub target_word: String,
    pub source_language: String,
    pub target_language: String,
    pub part_of_speech: String,
    pub canonical_word: Option<String>,
    pub definitions: Vec<String>,
    pub examples: Vec<ExampleSentence>,
    pub synonyms: Vec<String>,
    #[serde(rename = "PronunciationURL")]
    pub pronunciation_url: Option<String>,
    #[serde(rename = "MediaURLs")]
    pub media_urls: Vec<String>,
    pub conjugations: Option<serde_json::Value>,
    pub created_at: Option<String>,
    pub created_by: Option<String>,
}

impl EntryDraft {
    pub fn new(
        source_language: &str,
        source_word: &str,
        target_language: &str,
        target_word: &str,
        part_of_speech: &str,
    ) -> Self {
        Self {
            source_word: source_word.to_string(),
            target_word: target_word.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            part_of_speech: part_of_speech.to_string(),
            ..Self::default()
        }
    }

    pub fn with_canonical_word(mut self, word: &str) -> Self {
        self.canonical_word = Some(word.to_string());
        self
    }

    /// Normalizes both words once and derives every key from them.
    pub fn into_entry(self, normalizer: &dyn Normalizer) -> Result<VocabularyEntry, SearchError> {
        let source = normalizer.normalize(&self.source_word)?;
        let target = normalizer.normalize(&self.target_word)?;
        let canonical = match &self.canonical_word {
            Some(word) => Some(normalizer.normalize(word)?),
            None => None,
        };

        Ok(VocabularyEntry {
            pk: build_primary_key(&self.source_language, &source),
            sk: build_sort_key(&self.target_language, &self.part_of_speech),
            lookup_key: Some(build_reverse_key(&self.target_language, &target)),
            source_partition: Some(build_source_partition(&self.source_language)),
            canonical_word: canonical,
            source_word: self.source_word,
            target_word: self.target_word,
            normalized_source_word: Some(source),
            normalized_target_word: Some(target),
            source_language: self.source_language,
            target_language: self.target_language,
            part_of_speech: self.part_of_speech,
            definitions: self.definitions,
            examples: self.examples,
            synonyms: self.synonyms,
            pronunciation_url: self.pronunciation_url,
            media_urls: self.media_urls,
            conjugations: self.conjugations,
            created_at: self.created_at,
            created_by: self.created_by,
        })
    }
}

// --- HTTP payloads ---

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<usize>,
    pub source: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<VocabularyEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchGetRequest {
    /// Composite `<PK>|<SK>` strings.
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchGetResponse {
    /// Keyed by the composite `<PK>|<SK>` string.
    pub entries: HashMap<String, VocabularyEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
