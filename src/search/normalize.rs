use crate::error::SearchError;

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Word normalization applied before key construction.
///
/// Implementations must be idempotent: `normalize(normalize(w)) == normalize(w)`.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, word: &str) -> Result<String, SearchError>;
}

/// Case and diacritic folding for Latin scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FoldingNormalizer;

impl Normalizer for FoldingNormalizer {
    fn normalize(&self, word: &str) -> Result<String, SearchError> {
        let trimmed = word.trim();
        if trimmed.is_empty() {
            return Err(SearchError::InvalidQuery("query is empty".to_string()));
        }
        if let Some(c) = trimmed.chars().find(|c| c.is_control() && !c.is_whitespace()) {
            return Err(SearchError::InvalidQuery(format!(
                "query contains control character {:?}",
                c
            )));
        }

        let folded: String = trimmed.to_lowercase().chars().map(fold_diacritic).collect();
        Ok(WHITESPACE.replace_all(&folded, " ").into_owned())
    }
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
