use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{AppError, AppResult};
use std::time::Instant;

use crate::core::ServerState;
use crate::sales::{CompleteSaleRequest, CompleteSaleResponse};
use crate::search::SearchHit;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub shop_id: String,
    /// Result cap; the server default applies when unset
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<SearchHit>,
    pub meta: SearchMeta,
}

#[derive(Debug, Serialize)]
pub struct SearchMeta {
    pub shop_id: String,
    pub query: String,
    pub results: usize,
    pub processing_time_ms: u64,
    /// False only before the first successful cache build
    pub using_index: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_built_at: Option<DateTime<Utc>>,
}

/// POST /api/sales/search
///
/// Shop scoping is mandatory; a query under 2 characters is rejected rather
/// than silently returning nothing.
pub async fn search(
    State(state): State<ServerState>,
    Json(req): Json<SearchRequest>,
) -> AppResult<Json<SearchResponse>> {
    if req.shop_id.is_empty() {
        return Err(AppError::validation("Missing shop_id"));
    }
    let query = req.query.trim();
    if query.chars().count() < 2 {
        return Err(AppError::validation("Query must be at least 2 characters")
            .with_detail("min_length", 2));
    }

    let started = Instant::now();
    let cache = state.cache.get();
    let limit = req.limit.unwrap_or(state.config.search_default_limit);
    let items = cache.index.search(query, Some(&req.shop_id), limit);

    tracing::debug!(
        shop_id = %req.shop_id,
        query,
        results = items.len(),
        "Search served"
    );

    Ok(Json(SearchResponse {
        meta: SearchMeta {
            shop_id: req.shop_id,
            query: query.to_string(),
            results: items.len(),
            processing_time_ms: started.elapsed().as_millis() as u64,
            using_index: cache.index.built_at.is_some(),
            cache_built_at: cache.index.built_at,
        },
        items,
    }))
}

/// POST /api/sales/complete
pub async fn complete(
    State(state): State<ServerState>,
    Json(req): Json<CompleteSaleRequest>,
) -> AppResult<Json<CompleteSaleResponse>> {
    let response = state.sales.complete_sale(req).await?;
    Ok(Json(response))
}
