use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::catalog::CatalogCache;
use crate::core::Config;
use crate::sales::SaleService;
use crate::store::{DocStore, MemoryStore};

/// Shared server state handed to every handler
///
/// Cloning is shallow: every field is either a [`Config`] copy or an Arc.
///
/// | Field | Description |
/// |-------|-------------|
/// | config | Configuration (immutable after startup) |
/// | store | Document store boundary |
/// | cache | Catalog snapshot + search index |
/// | sales | Sale completion workflow |
/// | shutdown | Cancels background tasks |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub store: Arc<dyn DocStore>,
    pub cache: Arc<CatalogCache>,
    pub sales: SaleService,
    shutdown: CancellationToken,
}

impl ServerState {
    /// Initialize state from configuration
    ///
    /// Builds the document store (seeded from `CATALOG_SEED` when set) and
    /// warms the catalog cache. A failed warm-up is logged and startup
    /// continues; the cache serves empty until the first successful rebuild.
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn DocStore> = match &config.catalog_seed {
            Some(path) => {
                let store = MemoryStore::seed_from_file(path)?;
                tracing::info!(path = %path, documents = store.len(), "Loaded catalog seed");
                Arc::new(store)
            }
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::with_store(config.clone(), store).await)
    }

    /// Build state over an existing store
    ///
    /// Used directly by tests; [`initialize`](Self::initialize) delegates here.
    pub async fn with_store(config: Config, store: Arc<dyn DocStore>) -> Self {
        let cache = Arc::new(CatalogCache::new(store.clone(), config.scores));

        // Warm-up: an unreachable store at boot must not kill the process
        match cache.refresh().await {
            Ok(state) => tracing::info!(
                shops = state.snapshot.total_shops,
                items = state.snapshot.total_items,
                "Catalog cache warmed up"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                "Cache warm-up failed; serving empty until first rebuild"
            ),
        }

        Self {
            sales: SaleService::new(store.clone()),
            config,
            store,
            cache,
            shutdown: CancellationToken::new(),
        }
    }

    /// Spawn background tasks (catalog change listener)
    pub fn start_background_tasks(&self) {
        let _ = self
            .cache
            .spawn_change_listener(self.shutdown.child_token());
    }

    /// Signal background tasks to stop
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::item_path;
    use serde_json::json;

    #[tokio::test]
    async fn test_with_store_warms_cache() {
        let store = Arc::new(MemoryStore::new());
        store.insert("shops/s1", json!({"name": "Shop"}));
        store.insert("shops/s1/categories/c1", json!({"name": "Misc"}));
        store.insert(&item_path("s1", "c1", "i1"), json!({"name": "Sugar"}));

        let state = ServerState::with_store(Config::from_env(), store).await;
        assert_eq!(state.cache.get().snapshot.total_items, 1);
    }

    #[tokio::test]
    async fn test_empty_store_still_initializes() {
        let state =
            ServerState::with_store(Config::from_env(), Arc::new(MemoryStore::new())).await;
        assert_eq!(state.cache.get().snapshot.total_shops, 0);
        assert!(state.cache.get().snapshot.built_at.is_some());
    }
}
