//! Sales API module
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/sales/search | POST | Product search scoped to one shop |
//! | /api/sales/complete | POST | Complete a sale (stock deduction) |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sales", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/search", post(handler::search))
        .route("/complete", post(handler::complete))
}
