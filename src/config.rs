//! Engine Configuration
//!
//! Tunables for the search engine and the HTTP binary. Values come from
//! `SearchConfig::default()` and can be overridden through `VOCAB_*`
//! environment variables.
//!
//! ## Variables
//! - `VOCAB_LANGUAGES`: comma separated supported language codes (`en,es`).
//! - `VOCAB_DEFAULT_LIMIT` / `VOCAB_MAX_LIMIT`: result count bounds.
//! - `VOCAB_SCAN_BATCH` / `VOCAB_SCAN_PAGES`: fallback scan page size and page budget.
//! - `VOCAB_FALLBACK`: `empty` or `half`, see [`FallbackPolicy`].
//! - `VOCAB_TIMEOUT_MS`: per-search deadline, `0` disables it.
//! - `VOCAB_BIND`: HTTP listen address.

use anyhow::{Context, Result, anyhow};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// When the exhaustive table scan runs after the targeted strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Scan only when no targeted strategy found anything.
    #[default]
    WhenEmpty,
    /// Scan when fewer than half of the requested entries were found.
    BelowHalfLimit,
}

impl FallbackPolicy {
    pub fn should_scan(&self, found: usize, limit: usize) -> bool {
        match self {
            FallbackPolicy::WhenEmpty => found == 0,
            FallbackPolicy::BelowHalfLimit => found == 0 || found < limit / 2,
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empty" => Ok(FallbackPolicy::WhenEmpty),
            "half" => Ok(FallbackPolicy::BelowHalfLimit),
            other => Err(anyhow!("Unknown fallback policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Language codes tried by the free-text fan-out.
    pub supported_languages: Vec<String>,
    /// Used when a caller passes a limit of zero.
    pub default_limit: usize,
    /// Upper bound for any caller supplied limit.
    pub max_limit: usize,
    /// Records evaluated per fallback scan page.
    pub scan_batch_size: usize,
    /// Maximum fallback scan pages per search.
    pub scan_max_pages: usize,
    pub fallback_policy: FallbackPolicy,
    /// Deadline applied to each HTTP search request.
    pub search_timeout: Option<Duration>,
    pub bind_addr: SocketAddr,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            supported_languages: vec!["en".to_string(), "es".to_string()],
            default_limit: 20,
            max_limit: 100,
            scan_batch_size: 1000,
            scan_max_pages: 10,
            fallback_policy: FallbackPolicy::WhenEmpty,
            search_timeout: Some(Duration::from_secs(5)),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

impl SearchConfig {
    /// Builds a config from defaults overlaid with `VOCAB_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("VOCAB_LANGUAGES") {
            let languages = parse_languages(&raw);
            if languages.is_empty() {
                return Err(anyhow!("VOCAB_LANGUAGES must name at least one language"));
            }
            config.supported_languages = languages;
        }
        if let Some(raw) = lookup("VOCAB_DEFAULT_LIMIT") {
            config.default_limit = parse_var("VOCAB_DEFAULT_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("VOCAB_MAX_LIMIT") {
            config.max_limit = parse_var("VOCAB_MAX_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("VOCAB_SCAN_BATCH") {
            config.scan_batch_size = parse_var("VOCAB_SCAN_BATCH", &raw)?;
        }
        if let Some(raw) = lookup("VOCAB_SCAN_PAGES") {
            config.scan_max_pages = parse_var("VOCAB_SCAN_PAGES", &raw)?;
        }
        if let Some(raw) = lookup("VOCAB_FALLBACK") {
            config.fallback_policy = parse_var("VOCAB_FALLBACK", &raw)?;
        }
        if let Some(raw) = lookup("VOCAB_TIMEOUT_MS") {
            let millis: u64 = parse_var("VOCAB_TIMEOUT_MS", &raw)?;
            config.search_timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }
        if let Some(raw) = lookup("VOCAB_BIND") {
            config.bind_addr = parse_var("VOCAB_BIND", &raw)?;
        }

        if config.default_limit == 0 || config.default_limit > config.max_limit {
            return Err(anyhow!(
                "default limit {} must be between 1 and max limit {}",
                config.default_limit,
                config.max_limit
            ));
        }
        if config.scan_batch_size == 0 {
            return Err(anyhow!("VOCAB_SCAN_BATCH must be greater than zero"));
        }

        Ok(config)
    }

    /// Maps a caller supplied limit into `1..=max_limit`.
    pub fn resolve_limit(&self, requested: usize) -> usize {
        if requested == 0 {
            self.default_limit
        } else {
            requested.min(self.max_limit)
        }
    }
}

fn parse_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|lang| lang.trim().to_ascii_lowercase())
        .filter(|lang| !lang.is_empty())
        .collect()
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("Invalid value '{}' for {}", raw, name))
}
