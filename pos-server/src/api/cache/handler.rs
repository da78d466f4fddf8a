use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{AppError, AppResult, ErrorCode};

use crate::core::ServerState;

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub built_at: Option<DateTime<Utc>>,
    pub total_shops: usize,
    pub total_items: usize,
    pub total_selling_units: usize,
    pub total_batches: usize,
    pub keywords: usize,
    pub prefixes: usize,
}

/// GET /api/cache/status
pub async fn status(State(state): State<ServerState>) -> Json<CacheStatus> {
    let cache = state.cache.get();
    Json(CacheStatus {
        built_at: cache.snapshot.built_at,
        total_shops: cache.snapshot.total_shops,
        total_items: cache.snapshot.total_items,
        total_selling_units: cache.snapshot.total_selling_units,
        total_batches: cache.snapshot.total_batches,
        keywords: cache.index.keyword_count(),
        prefixes: cache.index.prefix_count(),
    })
}

#[derive(Debug, Serialize)]
pub struct CacheDebug {
    pub status: CacheStatus,
    /// A real item pulled from the cache, proving the walk produced data
    pub sample: DebugSample,
}

#[derive(Debug, Serialize)]
pub struct DebugSample {
    pub shop_id: String,
    pub shop_name: String,
    pub category_name: String,
    pub item_id: String,
    pub item_name: String,
    pub stock: f64,
    pub batches: usize,
    pub selling_units: usize,
}

/// GET /api/cache/debug
///
/// Probes the first cached item. 404 with [`ErrorCode::CacheEmpty`] when the
/// cache holds nothing, which distinguishes "empty catalog" from "cache never
/// built" in the status payload.
pub async fn debug(State(state): State<ServerState>) -> AppResult<Json<CacheDebug>> {
    let cache = state.cache.get();

    let probe = cache.snapshot.shops.iter().find_map(|shop| {
        let category = shop.categories.first()?;
        let item = category.items.first()?;
        Some(DebugSample {
            shop_id: shop.id.clone(),
            shop_name: shop.name.clone(),
            category_name: category.name.clone(),
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            stock: item.stock,
            batches: item.batches.len(),
            selling_units: item.selling_units.len(),
        })
    });

    let Some(sample) = probe else {
        return Err(AppError::with_message(
            ErrorCode::CacheEmpty,
            "Cache holds no items",
        )
        .with_detail("built_at", serde_json::to_value(cache.snapshot.built_at).unwrap_or_default()));
    };

    Ok(Json(CacheDebug {
        status: CacheStatus {
            built_at: cache.snapshot.built_at,
            total_shops: cache.snapshot.total_shops,
            total_items: cache.snapshot.total_items,
            total_selling_units: cache.snapshot.total_selling_units,
            total_batches: cache.snapshot.total_batches,
            keywords: cache.index.keyword_count(),
            prefixes: cache.index.prefix_count(),
        },
        sample,
    }))
}

/// POST /api/cache/refresh
///
/// Forces a full rebuild; responds with the counters of the state now serving.
pub async fn refresh(State(state): State<ServerState>) -> AppResult<Json<CacheStatus>> {
    let rebuilt = state.cache.refresh().await.map_err(AppError::from)?;
    Ok(Json(CacheStatus {
        built_at: rebuilt.snapshot.built_at,
        total_shops: rebuilt.snapshot.total_shops,
        total_items: rebuilt.snapshot.total_items,
        total_selling_units: rebuilt.snapshot.total_selling_units,
        total_batches: rebuilt.snapshot.total_batches,
        keywords: rebuilt.index.keyword_count(),
        prefixes: rebuilt.index.prefix_count(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct OptimizationQuery {
    /// Restrict the report to one shop
    pub shop_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OptimizationReport {
    pub batch_stats: BatchStats,
    /// Items still selling from the scalar stock field
    pub items_without_batches: Vec<UnbatchedItem>,
}

#[derive(Debug, Serialize)]
pub struct BatchStats {
    pub total_items: usize,
    pub items_with_batches: usize,
    pub items_without_batches: usize,
    pub total_batches: usize,
    pub percentage_with_batches: f64,
}

#[derive(Debug, Serialize)]
pub struct UnbatchedItem {
    pub shop_id: String,
    pub item_id: String,
    pub name: String,
    pub category_name: String,
    pub stock: f64,
}

/// GET /api/items/optimization
///
/// Reports how much of the catalog has migrated to batch tracking. Items
/// without batches fall back to scalar stock and cannot FIFO-allocate.
pub async fn optimization(
    State(state): State<ServerState>,
    Query(query): Query<OptimizationQuery>,
) -> Json<OptimizationReport> {
    let cache = state.cache.get();

    let mut total_items = 0usize;
    let mut with_batches = 0usize;
    let mut total_batches = 0usize;
    let mut unbatched = Vec::new();

    for shop in &cache.snapshot.shops {
        if let Some(scope) = &query.shop_id {
            if &shop.id != scope {
                continue;
            }
        }
        for category in &shop.categories {
            for item in &category.items {
                total_items += 1;
                if item.has_batches {
                    with_batches += 1;
                    total_batches += item.batches.len();
                } else {
                    unbatched.push(UnbatchedItem {
                        shop_id: shop.id.clone(),
                        item_id: item.id.clone(),
                        name: item.name.clone(),
                        category_name: category.name.clone(),
                        stock: item.stock,
                    });
                }
            }
        }
    }

    let percentage = if total_items > 0 {
        (with_batches as f64 / total_items as f64) * 100.0
    } else {
        0.0
    };

    Json(OptimizationReport {
        batch_stats: BatchStats {
            total_items,
            items_with_batches: with_batches,
            items_without_batches: total_items - with_batches,
            total_batches,
            percentage_with_batches: (percentage * 100.0).round() / 100.0,
        },
        items_without_batches: unbatched,
    })
}
