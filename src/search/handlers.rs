use super::context::SearchContext;
use super::engine::SearchEngine;
use super::keys::parse_entry_key;
use super::types::{BatchGetRequest, BatchGetResponse, ErrorResponse, SearchParams, SearchResponse};
use crate::error::SearchError;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn request_context(engine: &SearchEngine) -> SearchContext {
    match engine.config().search_timeout {
        Some(timeout) => SearchContext::with_timeout(timeout),
        None => SearchContext::new(),
    }
}

fn error_response(err: SearchError) -> HandlerError {
    let status = match &err {
        SearchError::InvalidQuery(_) | SearchError::InvalidKey(_) => StatusCode::BAD_REQUEST,
        SearchError::BatchGet { .. } => StatusCode::BAD_GATEWAY,
    };
    tracing::debug!("Request failed: {}", err);
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Language codes are stored lowercase; a blank hint counts as absent.
fn language_hint(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_ascii_lowercase)
}

pub async fn handle_search(
    Query(params): Query<SearchParams>,
    Extension(engine): Extension<Arc<SearchEngine>>,
) -> Result<Json<SearchResponse>, HandlerError> {
    let ctx = request_context(&engine);
    let limit = params.limit.unwrap_or(0);
    let source = language_hint(params.source.as_deref());
    let target = language_hint(params.target.as_deref());

    let results = engine
        .search_with_language_hints(&ctx, &params.q, source.as_deref(), target.as_deref(), limit)
        .await
        .map_err(error_response)?;

    Ok(Json(SearchResponse {
        query: params.q,
        count: results.len(),
        results,
    }))
}

pub async fn handle_batch_get(
    Extension(engine): Extension<Arc<SearchEngine>>,
    Json(req): Json<BatchGetRequest>,
) -> Result<Json<BatchGetResponse>, HandlerError> {
    let keys = req
        .keys
        .iter()
        .map(|composite| parse_entry_key(composite))
        .collect::<Result<Vec<_>, _>>()
        .map_err(error_response)?;
    let ctx = request_context(&engine);

    match engine.batch_get_by_keys(&ctx, &keys).await {
        Ok(entries) => Ok(Json(BatchGetResponse { entries })),
        Err(e) => {
            tracing::error!("Batch get failed: {:?}", e);
            Err(error_response(e))
        }
    }
}

pub async fn handle_health() -> &'static str {
    "ok"
}
