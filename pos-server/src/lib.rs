//! POS Server - inventory/sales backend for a multi-tenant point-of-sale
//!
//! # Architecture
//!
//! Reads flow one direction: document store → snapshot builder → cache
//! controller → {search index, HTTP handlers}. Writes flow: HTTP handler →
//! sale workflow → document store → change notification → cache rebuild.
//!
//! # Module structure
//!
//! ```text
//! pos-server/src/
//! ├── core/     # Config, server state, HTTP server
//! ├── store/    # Document store boundary + in-memory implementation
//! ├── catalog/  # Catalog snapshot builder and cache controller
//! ├── search/   # Keyword search index over the catalog
//! ├── sales/    # FIFO allocation and sale completion workflow
//! ├── api/      # HTTP routes and handlers
//! └── utils/    # Logging and small helpers
//! ```

pub mod api;
pub mod catalog;
pub mod core;
pub mod sales;
pub mod search;
pub mod store;
pub mod utils;

// Re-export public types
pub use core::{Config, Server, ServerState};

// Re-export unified error types from shared
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Set up the process environment: dotenv and logging
pub fn setup_environment() {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    utils::logger::init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
}
