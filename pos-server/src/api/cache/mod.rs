//! Cache API module
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/cache/status | GET | Snapshot and index counters |
//! | /api/cache/debug | GET | First-item probe for live troubleshooting |
//! | /api/cache/refresh | POST | Force a full rebuild |
//! | /api/items/optimization | GET | Batch coverage report per shop |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/cache", routes())
        .route("/api/items/optimization", get(handler::optimization))
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/status", get(handler::status))
        .route("/debug", get(handler::debug))
        .route("/refresh", post(handler::refresh))
}
