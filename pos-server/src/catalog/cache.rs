//! Cache controller
//!
//! Owns exactly one live snapshot + search index pair. `refresh()` builds a
//! complete replacement and swaps it in with a single pointer write, so
//! readers always see either the fully-old or fully-new state. Rebuild
//! triggers (change notifications, manual refresh) serialize behind a tokio
//! mutex; a failed rebuild leaves the previous snapshot serving.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::search::{ScoreConfig, SearchIndex};
use crate::store::{DocStore, ITEMS_GROUP, SELL_UNITS_GROUP, StoreResult};

use super::snapshot::{self, CatalogSnapshot};

/// The atomic unit exposed to readers: a snapshot paired with its index
#[derive(Debug)]
pub struct CacheState {
    pub snapshot: CatalogSnapshot,
    pub index: SearchIndex,
}

impl CacheState {
    fn empty() -> Self {
        Self {
            snapshot: CatalogSnapshot::empty(),
            index: SearchIndex::empty(),
        }
    }
}

/// Process-wide catalog cache, single writer at a time
pub struct CatalogCache {
    store: Arc<dyn DocStore>,
    scores: ScoreConfig,
    current: RwLock<Arc<CacheState>>,
    // Serializes rebuilds; overlapping triggers queue here instead of
    // constructing snapshots concurrently over a non-atomic external read
    rebuild: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.get();
        f.debug_struct("CatalogCache")
            .field("total_shops", &state.snapshot.total_shops)
            .field("total_items", &state.snapshot.total_items)
            .finish()
    }
}

impl CatalogCache {
    pub fn new(store: Arc<dyn DocStore>, scores: ScoreConfig) -> Self {
        Self {
            store,
            scores,
            current: RwLock::new(Arc::new(CacheState::empty())),
            rebuild: tokio::sync::Mutex::new(()),
        }
    }

    /// Cheap read of the current state; the returned Arc stays fully
    /// consistent even while a rebuild is in progress
    pub fn get(&self) -> Arc<CacheState> {
        self.current.read().clone()
    }

    /// Rebuild the snapshot and index, then swap them in atomically
    ///
    /// On failure the previous state remains in effect and the error is
    /// returned to the caller; the cache never serves a partial rebuild.
    pub async fn refresh(&self) -> StoreResult<Arc<CacheState>> {
        let _guard = self.rebuild.lock().await;

        let snapshot = match snapshot::build(self.store.as_ref()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(error = %e, "Cache refresh failed; keeping previous snapshot");
                return Err(e);
            }
        };
        let index = SearchIndex::build(&snapshot.shops, self.scores);

        let state = Arc::new(CacheState { snapshot, index });
        // The swap is the sole mutation visible to readers
        *self.current.write() = state.clone();
        Ok(state)
    }

    /// Spawn the change-notification listener
    ///
    /// Every event on the items or sellUnits collection groups triggers a
    /// full refresh; event payloads are not diffed.
    pub fn spawn_change_listener(
        self: &Arc<Self>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let mut items_rx = cache.store.subscribe(ITEMS_GROUP);
        let mut sell_units_rx = cache.store.subscribe(SELL_UNITS_GROUP);

        tokio::spawn(async move {
            loop {
                let group = tokio::select! {
                    _ = token.cancelled() => break,
                    event = items_rx.recv() => match event {
                        Ok(e) => e.group,
                        // Lagged just means we missed events; a full rebuild
                        // covers them all anyway
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                            ITEMS_GROUP.to_string()
                        }
                        Err(_) => break,
                    },
                    event = sell_units_rx.recv() => match event {
                        Ok(e) => e.group,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                            SELL_UNITS_GROUP.to_string()
                        }
                        Err(_) => break,
                    },
                };

                tracing::info!(group, "Catalog changed, refreshing cache");
                if let Err(e) = cache.refresh().await {
                    tracing::warn!(group, error = %e, "Change-triggered refresh failed");
                }
            }
            tracing::info!("Catalog change listener stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        ChangeEvent, Document, MemoryStore, StoreError, item_path,
    };
    use async_trait::async_trait;
    use serde_json::{Map, Value, json};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::broadcast;

    fn seeded_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.insert("shops/s1", json!({"name": "Corner Shop"}));
        store.insert("shops/s1/categories/c1", json!({"name": "Dry Goods"}));
        store.insert(
            &item_path("s1", "c1", "i1"),
            json!({
                "name": "Sugar",
                "batches": [
                    { "id": "b1", "quantity": 5.0, "sellPrice": 120.0, "timestamp": 100 }
                ]
            }),
        );
        Arc::new(store)
    }

    /// Store that can be flipped into a failing mode
    struct FlakyStore {
        inner: Arc<MemoryStore>,
        failing: AtomicBool,
    }

    #[async_trait]
    impl crate::store::DocStore for FlakyStore {
        async fn stream_all(&self, collection_path: &str) -> StoreResult<Vec<Document>> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("injected outage".to_string()));
            }
            self.inner.stream_all(collection_path).await
        }

        fn subscribe(&self, collection_group: &str) -> broadcast::Receiver<ChangeEvent> {
            self.inner.subscribe(collection_group)
        }

        async fn get(&self, document_path: &str) -> StoreResult<Option<Document>> {
            self.inner.get(document_path).await
        }

        async fn update(
            &self,
            document_path: &str,
            fields: Map<String, Value>,
        ) -> StoreResult<()> {
            self.inner.update(document_path, fields).await
        }
    }

    #[tokio::test]
    async fn test_refresh_swaps_complete_state() {
        let cache = CatalogCache::new(seeded_store(), ScoreConfig::default());
        assert_eq!(cache.get().snapshot.total_items, 0);

        cache.refresh().await.unwrap();
        let state = cache.get();
        assert_eq!(state.snapshot.total_items, 1);
        assert_eq!(state.index.search("sugar", None, 50).len(), 1);
    }

    #[tokio::test]
    async fn test_idempotent_rebuild() {
        let cache = CatalogCache::new(seeded_store(), ScoreConfig::default());
        cache.refresh().await.unwrap();
        let first = cache.get();
        cache.refresh().await.unwrap();
        let second = cache.get();

        assert_eq!(first.snapshot.total_items, second.snapshot.total_items);
        assert_eq!(first.snapshot.total_shops, second.snapshot.total_shops);
        let a = first.index.search("sugar", Some("s1"), 50);
        let b = second.index.search("sugar", Some("s1"), 50);
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::to_value(&b).unwrap()
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let flaky = Arc::new(FlakyStore {
            inner: seeded_store(),
            failing: AtomicBool::new(false),
        });
        let cache = CatalogCache::new(flaky.clone(), ScoreConfig::default());
        cache.refresh().await.unwrap();
        let before = cache.get();

        flaky.failing.store(true, Ordering::SeqCst);
        assert!(cache.refresh().await.is_err());

        let after = cache.get();
        assert!(Arc::ptr_eq(&before, &after), "stale snapshot must keep serving");
        assert_eq!(after.snapshot.total_items, 1);
    }

    #[tokio::test]
    async fn test_reader_holds_consistent_snapshot_across_refresh() {
        let store = seeded_store();
        let cache = CatalogCache::new(store.clone(), ScoreConfig::default());
        cache.refresh().await.unwrap();
        let held = cache.get();

        // Catalog grows while the reader holds its reference
        store.insert(
            &item_path("s1", "c1", "i2"),
            json!({"name": "Salt", "batches": []}),
        );
        cache.refresh().await.unwrap();

        assert_eq!(held.snapshot.total_items, 1);
        assert_eq!(cache.get().snapshot.total_items, 2);
    }
}
