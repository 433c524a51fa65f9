//! Key construction for the vocabulary table and its indexes.
//!
//! Every function expects words that are already normalized; none of them
//! normalize again.

use crate::error::SearchError;
use crate::storage::table::EntryKey;

/// `SRC#<sourceLang>#<word>`
pub fn build_primary_key(source_lang: &str, word: &str) -> String {
    format!("SRC#{}#{}", source_lang, word)
}

/// `TGT#<targetLang>#POS#<partOfSpeech>`
pub fn build_sort_key(target_lang: &str, part_of_speech: &str) -> String {
    format!("TGT#{}#POS#{}", target_lang, part_of_speech)
}

/// Prefix shared by every sort key of one target language.
pub fn build_sort_key_prefix(target_lang: &str) -> String {
    format!("TGT#{}#", target_lang)
}

/// `LKP#<targetLang>#<word>`
pub fn build_reverse_key(target_lang: &str, word: &str) -> String {
    format!("LKP#{}#{}", target_lang, word)
}

/// `SRC_LANG#<sourceLang>`, range key of the reverse-lookup index.
pub fn build_source_partition(source_lang: &str) -> String {
    format!("SRC_LANG#{}", source_lang)
}

/// Parses a composite `<PK>|<SK>` string.
pub fn parse_entry_key(composite: &str) -> Result<EntryKey, SearchError> {
    match composite.rsplit_once('|') {
        Some((pk, sk)) if pk.starts_with("SRC#") && sk.starts_with("TGT#") => {
            Ok(EntryKey::new(pk, sk))
        }
        _ => Err(SearchError::InvalidKey(composite.to_string())),
    }
}
