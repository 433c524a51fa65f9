use anyhow::Context;
use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use vocab_search::config::SearchConfig;
use vocab_search::search::engine::SearchEngine;
use vocab_search::search::handlers::{handle_batch_get, handle_health, handle_search};
use vocab_search::search::normalize::{FoldingNormalizer, Normalizer};
use vocab_search::search::types::EntryDraft;
use vocab_search::storage::InMemoryTable;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = SearchConfig::from_env()?;
    let mut seed_file: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                let value = args.get(i + 1).context("--bind needs an address")?;
                config.bind_addr = value.parse::<SocketAddr>()?;
                i += 2;
            }
            "--seed" => {
                let value = args.get(i + 1).context("--seed needs a file path")?;
                seed_file = Some(PathBuf::from(value));
                i += 2;
            }
            "--help" | "-h" => {
                eprintln!("Usage: {} [--bind <addr:port>] [--seed <entries.json>]", args[0]);
                return Ok(());
            }
            _ => {
                i += 1;
            }
        }
    }

    let normalizer: Arc<dyn Normalizer> = Arc::new(FoldingNormalizer);
    let table = InMemoryTable::new();

    if let Some(path) = &seed_file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let drafts: Vec<EntryDraft> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))?;
        for draft in drafts {
            let entry = draft.into_entry(normalizer.as_ref())?;
            table.put(&entry)?;
        }
        tracing::info!("Seeded {} entries from {}", table.len(), path.display());
    } else {
        tracing::info!("Starting with an empty vocabulary table");
    }

    tracing::info!(
        "Languages {:?}, fallback {:?}, scan {} x {}",
        config.supported_languages,
        config.fallback_policy,
        config.scan_max_pages,
        config.scan_batch_size
    );

    let bind_addr = config.bind_addr;
    let engine = Arc::new(SearchEngine::new(Arc::new(table), normalizer, config));

    let app = Router::new()
        .route("/search", get(handle_search))
        .route("/entries/batch", post(handle_batch_get))
        .route("/health", get(handle_health))
        .layer(Extension(engine));

    tracing::info!("HTTP server listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
