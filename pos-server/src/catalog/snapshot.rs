//! Catalog snapshot builder
//!
//! Depth-first walk of the document store: shops → categories → items →
//! {batches, selling units}. One full external read per rebuild; there is no
//! incremental diffing. Empty categories and shops with no categories are
//! pruned so downstream code never sees empty containers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::{Category, Item, SellingUnit, Shop};

use crate::store::doc::{RawCategory, RawItem, RawSellUnit, RawShop};
use crate::store::{
    DocStore, StoreResult, categories_path, items_path, sell_units_path, shops_path,
};

/// One complete, immutable in-memory copy of the catalog
///
/// Replaced wholesale by the cache controller, never edited in place, so
/// concurrent readers never observe a half-built state.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSnapshot {
    pub shops: Vec<Shop>,
    pub built_at: Option<DateTime<Utc>>,
    pub total_shops: usize,
    pub total_items: usize,
    pub total_selling_units: usize,
    pub total_batches: usize,
}

impl CatalogSnapshot {
    /// A snapshot that has never been built
    pub fn empty() -> Self {
        Self {
            shops: Vec::new(),
            built_at: None,
            total_shops: 0,
            total_items: 0,
            total_selling_units: 0,
            total_batches: 0,
        }
    }

    /// Find an item by shop and item id
    pub fn find_item(&self, shop_id: &str, item_id: &str) -> Option<&Item> {
        self.shops
            .iter()
            .find(|s| s.id == shop_id)?
            .categories
            .iter()
            .flat_map(|c| c.items.iter())
            .find(|i| i.id == item_id)
    }

    /// Find a selling unit by shop, item and sell-unit id
    pub fn find_selling_unit(
        &self,
        shop_id: &str,
        item_id: &str,
        sell_unit_id: &str,
    ) -> Option<&SellingUnit> {
        self.find_item(shop_id, item_id)?
            .selling_units
            .iter()
            .find(|su| su.id == sell_unit_id)
    }
}

/// Build a fresh snapshot from the document store
///
/// Fails only by propagating the store's read failure; the caller decides
/// whether to keep serving the previous snapshot. A failure fetching one
/// item's selling units is logged and that item keeps an empty list, matching
/// the tolerance of the original walk.
pub async fn build(store: &dyn DocStore) -> StoreResult<CatalogSnapshot> {
    let started = std::time::Instant::now();
    let mut shops = Vec::new();
    let mut total_items = 0usize;
    let mut total_selling_units = 0usize;
    let mut total_batches = 0usize;

    for shop_doc in store.stream_all(&shops_path()).await? {
        let shop_id = shop_doc.id.clone();
        let raw_shop: RawShop = shop_doc.parse(&shops_path())?;
        let mut categories = Vec::new();

        for cat_doc in store.stream_all(&categories_path(&shop_id)).await? {
            let category_id = cat_doc.id.clone();
            let raw_cat: RawCategory = cat_doc.parse(&categories_path(&shop_id))?;
            let mut items: Vec<Item> = Vec::new();

            for item_doc in store.stream_all(&items_path(&shop_id, &category_id)).await? {
                let item_id = item_doc.id.clone();
                let raw_item: RawItem = item_doc.parse(&items_path(&shop_id, &category_id))?;

                let selling_units =
                    fetch_selling_units(store, &shop_id, &category_id, &item_id, &raw_item).await;

                let item = raw_item.normalize(&item_id, &category_id, &raw_cat.name, selling_units);
                total_selling_units += item.selling_units.len();
                total_batches += item.batches.len();
                total_items += 1;
                items.push(item);
            }

            // Empty categories are not materialized
            if !items.is_empty() {
                categories.push(Category {
                    id: category_id,
                    name: raw_cat.name,
                    items,
                });
            }
        }

        if !categories.is_empty() {
            shops.push(Shop {
                id: shop_id,
                name: raw_shop.name,
                categories,
            });
        }
    }

    let snapshot = CatalogSnapshot {
        total_shops: shops.len(),
        total_items,
        total_selling_units,
        total_batches,
        shops,
        built_at: Some(Utc::now()),
    };

    tracing::info!(
        shops = snapshot.total_shops,
        items = snapshot.total_items,
        selling_units = snapshot.total_selling_units,
        batches = snapshot.total_batches,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Catalog snapshot built"
    );

    Ok(snapshot)
}

async fn fetch_selling_units(
    store: &dyn DocStore,
    shop_id: &str,
    category_id: &str,
    item_id: &str,
    raw_item: &RawItem,
) -> Vec<SellingUnit> {
    let path = sell_units_path(shop_id, category_id, item_id);
    match store.stream_all(&path).await {
        Ok(docs) => docs
            .iter()
            .filter_map(|doc| {
                let raw: RawSellUnit = match doc.parse(&path) {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!(shop_id, item_id, sell_unit_id = %doc.id, error = %e,
                            "Skipping malformed selling unit");
                        return None;
                    }
                };
                Some(raw.normalize(&doc.id, raw_item.thumbnail()))
            })
            .collect(),
        Err(e) => {
            tracing::warn!(shop_id, item_id, error = %e, "Failed to fetch selling units");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert("shops/s1", json!({"name": "Corner Shop"}));
        store.insert("shops/s1/categories/c1", json!({"name": "Dry Goods"}));
        store.insert(
            "shops/s1/categories/c1/items/i1",
            json!({
                "name": "Sugar",
                "images": ["sugar.jpg"],
                "sellPrice": 120.0,
                "stock": 50.0,
                "baseUnit": "kg",
                "batches": [
                    { "id": "b1", "batchName": "Jan", "quantity": 2.0, "sellPrice": 120.0, "timestamp": 100 },
                    { "id": "b2", "batch_name": "Feb", "quantity": 3.0, "sell_price": 125.0, "timestamp": 200 }
                ]
            }),
        );
        store.insert(
            "shops/s1/categories/c1/items/i1/sellUnits/su1",
            json!({
                "name": "Sack of 10",
                "conversionFactor": 0.1,
                "sellPrice": 1100.0,
                "batchLinks": [
                    { "batchId": "b1", "maxUnitsAvailable": 20.0, "allocatedUnits": 5.0, "pricePerUnit": 11.0, "batchTimestamp": 100 }
                ]
            }),
        );
        // Category with no items is pruned
        store.insert("shops/s1/categories/c2", json!({"name": "Empty"}));
        // Shop with no categories is pruned
        store.insert("shops/s2", json!({"name": "Ghost Shop"}));
        store
    }

    #[tokio::test]
    async fn test_build_walks_and_normalizes() {
        let store = seeded_store();
        let snapshot = build(&store).await.unwrap();

        assert_eq!(snapshot.total_shops, 1);
        assert_eq!(snapshot.total_items, 1);
        assert_eq!(snapshot.total_selling_units, 1);
        assert_eq!(snapshot.total_batches, 2);
        assert!(snapshot.built_at.is_some());

        let item = snapshot.find_item("s1", "i1").unwrap();
        assert_eq!(item.name, "Sugar");
        // Batch stock wins over the stored scalar
        assert_eq!(item.stock, 5.0);
        assert_eq!(item.base_unit, "kg");
        assert_eq!(item.batches[1].sell_price, 125.0);

        let su = snapshot.find_selling_unit("s1", "i1", "su1").unwrap();
        assert_eq!(su.total_units_available, 15.0);
        assert_eq!(su.thumbnail.as_deref(), Some("sugar.jpg"));
    }

    #[tokio::test]
    async fn test_empty_containers_pruned() {
        let store = seeded_store();
        let snapshot = build(&store).await.unwrap();

        let shop = &snapshot.shops[0];
        assert_eq!(shop.id, "s1");
        assert_eq!(shop.categories.len(), 1, "empty category must be pruned");
        assert!(snapshot.shops.iter().all(|s| s.id != "s2"));
    }

    #[tokio::test]
    async fn test_stock_fallback_without_batches() {
        let store = MemoryStore::new();
        store.insert("shops/s1", json!({"name": "Shop"}));
        store.insert("shops/s1/categories/c1", json!({"name": "Misc"}));
        store.insert(
            "shops/s1/categories/c1/items/i1",
            json!({"name": "Matches", "stock": 12.0}),
        );

        let snapshot = build(&store).await.unwrap();
        let item = snapshot.find_item("s1", "i1").unwrap();
        assert_eq!(item.stock, 12.0);
        assert!(!item.has_batches);
    }
}
