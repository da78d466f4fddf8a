use crate::search::ScoreConfig;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | HTTP_PORT | 5000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | SEARCH_DEFAULT_LIMIT | 50 | Max search results when the request sets none |
/// | CATALOG_SEED | (unset) | Path to a JSON seed file for the in-memory store |
/// | LOG_LEVEL | info | Tracing level filter |
/// | LOG_DIR | (unset) | Directory for daily-rolling log files |
///
/// # Example
///
/// ```ignore
/// HTTP_PORT=8080 CATALOG_SEED=./seed.json cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Result cap applied when a search request does not set its own limit
    pub search_default_limit: usize,
    /// Optional JSON seed file for the in-memory document store
    pub catalog_seed: Option<String>,
    /// Search ranking constants
    pub scores: ScoreConfig,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults.
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            search_default_limit: std::env::var("SEARCH_DEFAULT_LIMIT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(50),
            catalog_seed: std::env::var("CATALOG_SEED").ok(),
            scores: ScoreConfig::default(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
