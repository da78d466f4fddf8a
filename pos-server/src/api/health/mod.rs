//! Health check route
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/health | GET | Liveness plus cache readiness |

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::SystemTime;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// Status (healthy | degraded)
    status: &'static str,
    version: &'static str,
    /// Uptime in seconds
    uptime_seconds: u64,
    /// Whether the catalog cache has been built at least once
    cache_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_built_at: Option<DateTime<Utc>>,
}

// Server start time, pinned by mark_started() during startup
static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

/// Record the process start time; uptime is measured from the first call
pub fn mark_started() {
    let _ = START_TIME.set(SystemTime::now());
}

fn get_uptime_seconds() -> u64 {
    let start = START_TIME.get_or_init(SystemTime::now);
    SystemTime::now()
        .duration_since(*start)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let cache = state.cache.get();
    let cache_ready = cache.snapshot.built_at.is_some();

    Json(HealthResponse {
        status: if cache_ready { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: get_uptime_seconds(),
        cache_ready,
        cache_built_at: cache.snapshot.built_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_counts_from_mark_not_first_probe() {
        mark_started();
        let pinned = *START_TIME.get().unwrap();

        // Later probes must not re-seed the clock
        let _ = get_uptime_seconds();
        mark_started();
        assert_eq!(*START_TIME.get().unwrap(), pinned);
        assert!(get_uptime_seconds() < 60);
    }
}
