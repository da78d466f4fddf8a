//! Sale completion workflow
//!
//! Drives each cart line through: validate → locate batch → check stock →
//! deduct → record. The target batch comes either from an explicit
//! `batch_id` in the payload (direct-deduction path) or from running the
//! FIFO allocator over the item's batches.
//!
//! Each line persists its own store write immediately. A failure on line N
//! aborts the whole request and leaves lines 1..N-1 committed with no
//! compensating rollback - a known limitation preserved deliberately (and
//! asserted by tests) rather than silently "fixed".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::models::{Batch, ItemType, StockTransaction};
use shared::{AppError, AppResult, ErrorCode};
use std::sync::Arc;
use uuid::Uuid;

use crate::store::doc::{RawItem, RawSellUnit};
use crate::store::{DocStore, item_path, sell_unit_path};
use crate::utils::{now_millis, now_secs};

use super::allocator::{self, Allocation, AllocationError};

/// One line of the cart payload
#[derive(Debug, Clone, Deserialize)]
pub struct CartLine {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub category_id: String,
    /// Explicit target batch (direct-deduction path); FIFO when absent
    #[serde(default, alias = "batchId")]
    pub batch_id: Option<String>,
    /// Quantity as entered: base units for main items, selling units for
    /// selling-unit lines
    #[serde(default)]
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "default_conversion", alias = "conversionFactor")]
    pub conversion_factor: f64,
    #[serde(default, rename = "type")]
    pub item_type: ItemType,
    #[serde(default, alias = "sellUnitId")]
    pub sell_unit_id: Option<String>,
}

fn default_unit() -> String {
    "unit".to_string()
}

fn default_conversion() -> f64 {
    1.0
}

/// Complete-sale request payload
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteSaleRequest {
    #[serde(default)]
    pub shop_id: String,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default)]
    pub items: Vec<CartLine>,
}

/// Result of applying one deduction (one batch touched)
#[derive(Debug, Clone, Serialize)]
pub struct LineOutcome {
    pub item_id: String,
    pub item_type: ItemType,
    pub batch_id: String,
    pub quantity_sold: f64,
    pub base_units_deducted: f64,
    pub remaining_batch_quantity: f64,
    pub remaining_total_stock: f64,
    pub batch_exhausted: bool,
    pub total_price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteSaleResponse {
    pub success: bool,
    pub updated_items: Vec<LineOutcome>,
    pub receipt_id: String,
    pub message: String,
}

/// A planned stock deduction against one batch, not yet applied
#[derive(Debug, Clone)]
struct Deduction {
    batch_index: usize,
    base_qty: f64,
    quantity_sold: f64,
    unit_price: f64,
    total_price: f64,
}

/// Pending update to a selling unit's batch links (link-allocation path)
#[derive(Debug, Clone)]
struct LinkUpdate {
    sell_unit_id: String,
    links: Vec<shared::models::BatchLink>,
}

/// Sale completion service
#[derive(Clone)]
pub struct SaleService {
    store: Arc<dyn DocStore>,
}

impl SaleService {
    pub fn new(store: Arc<dyn DocStore>) -> Self {
        Self { store }
    }

    /// Complete a sale: apply every cart line and aggregate the outcomes
    pub async fn complete_sale(&self, req: CompleteSaleRequest) -> AppResult<CompleteSaleResponse> {
        if req.shop_id.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::RequiredField,
                "Missing shop_id",
            ));
        }
        if req.items.is_empty() {
            return Err(AppError::with_message(ErrorCode::RequiredField, "Missing items"));
        }

        tracing::info!(
            shop_id = %req.shop_id,
            lines = req.items.len(),
            "Completing sale"
        );

        let mut updated_items = Vec::new();
        for (idx, line) in req.items.iter().enumerate() {
            // Fail-fast: a failing line aborts the request; outcomes already
            // persisted for earlier lines stand
            let outcomes = self
                .process_line(&req.shop_id, req.seller.as_deref(), idx, line)
                .await?;
            updated_items.extend(outcomes);
        }

        Ok(CompleteSaleResponse {
            success: true,
            updated_items,
            receipt_id: Uuid::new_v4().to_string(),
            message: "Sale completed successfully".to_string(),
        })
    }

    async fn process_line(
        &self,
        shop_id: &str,
        seller: Option<&str>,
        idx: usize,
        line: &CartLine,
    ) -> AppResult<Vec<LineOutcome>> {
        // ==================== Validate ====================
        if line.item_id.is_empty() || line.category_id.is_empty() {
            return Err(AppError::validation("Invalid sale item payload")
                .with_detail("line", idx as i64));
        }
        if line.quantity <= 0.0 {
            return Err(AppError::with_message(
                ErrorCode::InvalidQuantity,
                "Quantity must be greater than zero",
            )
            .with_detail("line", idx as i64)
            .with_detail("quantity", line.quantity));
        }
        if line.item_type == ItemType::SellingUnit && line.conversion_factor <= 0.0 {
            return Err(AppError::validation("conversion_factor must be greater than zero")
                .with_detail("line", idx as i64));
        }

        // ==================== Locate item ====================
        let path = item_path(shop_id, &line.category_id, &line.item_id);
        let Some(doc) = self.store.get(&path).await? else {
            return Err(AppError::with_message(
                ErrorCode::ItemNotFound,
                format!("Item {} not found", line.item_id),
            )
            .with_detail("shop_id", shop_id)
            .with_detail("item_id", line.item_id.clone()));
        };
        let raw: RawItem = doc.parse(&path)?;
        let mut batches: Vec<Batch> = raw.batches.iter().map(|b| b.normalize()).collect();
        let total_stock = raw.stock.unwrap_or(0.0);

        // ==================== Locate batch / check stock ====================
        let (deductions, link_update) = match &line.batch_id {
            Some(batch_id) => (
                vec![self.plan_direct_deduction(shop_id, line, batch_id, &batches)?],
                None,
            ),
            None => self.plan_fifo_deductions(shop_id, line, &batches).await?,
        };

        // ==================== Deduct ====================
        for d in &deductions {
            batches[d.batch_index].quantity -= d.base_qty;
        }
        let deducted_base: f64 = deductions.iter().map(|d| d.base_qty).sum();
        let new_total_stock = total_stock - deducted_base;

        // ==================== Record ====================
        let transactions: Vec<StockTransaction> = deductions
            .iter()
            .map(|d| StockTransaction {
                id: format!("sale_{}", Uuid::new_v4().simple()),
                txn_type: "sale".to_string(),
                item_type: line.item_type,
                batch_id: batches[d.batch_index].id.clone(),
                quantity: d.base_qty,
                selling_units_quantity: (line.item_type == ItemType::SellingUnit)
                    .then_some(d.quantity_sold),
                unit: line.unit.clone(),
                sell_price: batches[d.batch_index].sell_price,
                unit_price: d.unit_price,
                total_price: d.total_price,
                timestamp: now_secs(),
                performed_by: seller.map(|s| s.to_string()),
                conversion_factor: (line.item_type == ItemType::SellingUnit)
                    .then_some(line.conversion_factor),
            })
            .collect();

        self.persist_item(&path, &raw, &batches, new_total_stock, &transactions)
            .await?;

        if let Some(update) = link_update {
            self.persist_link_update(shop_id, line, &update).await?;
        }

        // ==================== Aggregate ====================
        let mut remaining_stock = total_stock;
        let outcomes = deductions
            .iter()
            .zip(&transactions)
            .map(|(d, txn)| {
                remaining_stock -= d.base_qty;
                let batch = &batches[d.batch_index];
                tracing::info!(
                    shop_id,
                    item_id = %line.item_id,
                    batch_id = %batch.id,
                    base_units = d.base_qty,
                    remaining = batch.quantity,
                    total_price = d.total_price,
                    txn_id = %txn.id,
                    "Stock deducted"
                );
                LineOutcome {
                    item_id: line.item_id.clone(),
                    item_type: line.item_type,
                    batch_id: batch.id.clone(),
                    quantity_sold: d.quantity_sold,
                    base_units_deducted: d.base_qty,
                    remaining_batch_quantity: batch.quantity,
                    remaining_total_stock: remaining_stock,
                    batch_exhausted: batch.quantity == 0.0,
                    total_price: d.total_price,
                }
            })
            .collect();

        Ok(outcomes)
    }

    /// Direct-deduction path: the caller already chose the batch
    fn plan_direct_deduction(
        &self,
        shop_id: &str,
        line: &CartLine,
        batch_id: &str,
        batches: &[Batch],
    ) -> AppResult<Deduction> {
        let Some(batch_index) = batches.iter().position(|b| b.id == batch_id) else {
            return Err(AppError::with_message(
                ErrorCode::BatchNotFound,
                format!("Batch {} not found for item {}", batch_id, line.item_id),
            )
            .with_detail("shop_id", shop_id)
            .with_detail("item_id", line.item_id.clone())
            .with_detail("batch_id", batch_id.to_string()));
        };
        let batch = &batches[batch_index];

        let (base_qty, unit_price, total_price) = match line.item_type {
            ItemType::MainItem => {
                let base_qty = line.quantity;
                (base_qty, batch.sell_price, batch.sell_price * base_qty)
            }
            ItemType::SellingUnit => {
                let base_qty = line.quantity / line.conversion_factor;
                let unit_price = batch.sell_price / line.conversion_factor;
                (base_qty, unit_price, unit_price * line.quantity)
            }
        };

        if batch.quantity < base_qty {
            return Err(AppError::insufficient_stock(base_qty, batch.quantity)
                .with_detail("batch_id", batch.id.clone())
                .with_detail("item_type", line.item_type.as_str())
                .with_detail("quantity_requested", line.quantity)
                .with_detail("conversion_factor", line.conversion_factor));
        }

        Ok(Deduction {
            batch_index,
            base_qty,
            quantity_sold: line.quantity,
            unit_price,
            total_price,
        })
    }

    /// FIFO path: no batch chosen by the caller
    ///
    /// Selling units with batch links allocate through the links (and carry a
    /// pending link update); everything else allocates base units straight
    /// from the item's batches.
    async fn plan_fifo_deductions(
        &self,
        shop_id: &str,
        line: &CartLine,
        batches: &[Batch],
    ) -> AppResult<(Vec<Deduction>, Option<LinkUpdate>)> {
        match line.item_type {
            ItemType::MainItem => {
                let allocation = allocator::allocate_main_item(batches, line.quantity)
                    .map_err(|e| allocation_error(e, line))?;
                Ok((self.deductions_from(&allocation, batches, line, 1.0)?, None))
            }
            ItemType::SellingUnit => {
                if let Some(update) = self.try_link_allocation(shop_id, line, batches).await? {
                    return Ok(update);
                }
                // No batch links: allocate the base-unit equivalent directly
                let requested_base = line.quantity / line.conversion_factor;
                let allocation = allocator::allocate_main_item(batches, requested_base)
                    .map_err(|e| allocation_error(e, line))?;
                Ok((
                    self.deductions_from(&allocation, batches, line, line.conversion_factor)?,
                    None,
                ))
            }
        }
    }

    /// Attempt allocation through the selling unit's batch links
    async fn try_link_allocation(
        &self,
        shop_id: &str,
        line: &CartLine,
        batches: &[Batch],
    ) -> AppResult<Option<(Vec<Deduction>, Option<LinkUpdate>)>> {
        let Some(sell_unit_id) = &line.sell_unit_id else {
            return Ok(None);
        };
        let su_path = sell_unit_path(shop_id, &line.category_id, &line.item_id, sell_unit_id);
        let Some(doc) = self.store.get(&su_path).await? else {
            return Err(AppError::with_message(
                ErrorCode::SellingUnitNotFound,
                format!("Selling unit {} not found", sell_unit_id),
            )
            .with_detail("item_id", line.item_id.clone())
            .with_detail("sell_unit_id", sell_unit_id.clone()));
        };
        let raw: RawSellUnit = doc.parse(&su_path)?;
        let su = raw.normalize(sell_unit_id, None);
        if !su.has_batch_links {
            return Ok(None);
        }

        let allocation =
            allocator::allocate_selling_unit(&su.batch_links, line.quantity, su.conversion_factor)
                .map_err(|e| allocation_error(e, line))?;

        let mut deductions = Vec::new();
        let mut links = su.batch_links.clone();
        for alloc in &allocation.lines {
            let Some(batch_index) = batches.iter().position(|b| b.id == alloc.batch_id) else {
                return Err(AppError::with_message(
                    ErrorCode::BatchNotFound,
                    format!(
                        "Batch {} linked by selling unit {} not found",
                        alloc.batch_id, sell_unit_id
                    ),
                )
                .with_detail("batch_id", alloc.batch_id.clone()));
            };
            deductions.push(Deduction {
                batch_index,
                base_qty: alloc.base_units,
                quantity_sold: alloc.quantity,
                unit_price: alloc.unit_price,
                total_price: alloc.line_total,
            });
            if let Some(link) = links.iter_mut().find(|l| l.batch_id == alloc.batch_id) {
                link.allocated_units += alloc.quantity;
            }
        }

        Ok(Some((
            deductions,
            Some(LinkUpdate {
                sell_unit_id: sell_unit_id.clone(),
                links,
            }),
        )))
    }

    /// Turn allocator lines into planned deductions against `batches`
    ///
    /// `conversion_factor` re-denominates the allocator's base-unit lines for
    /// selling-unit requests (1.0 for main items).
    fn deductions_from(
        &self,
        allocation: &Allocation,
        batches: &[Batch],
        line: &CartLine,
        conversion_factor: f64,
    ) -> AppResult<Vec<Deduction>> {
        allocation
            .lines
            .iter()
            .map(|alloc| {
                let batch_index = batches
                    .iter()
                    .position(|b| b.id == alloc.batch_id)
                    .ok_or_else(|| {
                        AppError::internal(format!(
                            "Allocated batch {} missing from item {}",
                            alloc.batch_id, line.item_id
                        ))
                    })?;
                let quantity_sold = alloc.base_units * conversion_factor;
                let unit_price = alloc.unit_price / conversion_factor;
                Ok(Deduction {
                    batch_index,
                    base_qty: alloc.base_units,
                    quantity_sold,
                    unit_price,
                    total_price: alloc.line_total,
                })
            })
            .collect()
    }

    /// Persist the item mutation and its transaction records as one write
    async fn persist_item(
        &self,
        path: &str,
        raw: &RawItem,
        batches: &[Batch],
        new_total_stock: f64,
        transactions: &[StockTransaction],
    ) -> AppResult<()> {
        let mut history = raw.stock_transactions.clone();
        for txn in transactions {
            history.push(serde_json::to_value(txn).map_err(|e| AppError::internal(e.to_string()))?);
        }

        let mut fields = Map::new();
        fields.insert(
            "batches".to_string(),
            serde_json::to_value(batches).map_err(|e| AppError::internal(e.to_string()))?,
        );
        fields.insert("stock".to_string(), Value::from(new_total_stock));
        fields.insert("stockTransactions".to_string(), Value::Array(history));
        fields.insert("lastStockUpdate".to_string(), Value::from(now_millis()));
        if let Some(last) = transactions.last() {
            fields.insert("lastTransactionId".to_string(), Value::from(last.id.clone()));
        }

        self.store.update(path, fields).await?;
        Ok(())
    }

    /// Persist bumped `allocated_units` on the selling unit's batch links
    async fn persist_link_update(
        &self,
        shop_id: &str,
        line: &CartLine,
        update: &LinkUpdate,
    ) -> AppResult<()> {
        let su_path = sell_unit_path(
            shop_id,
            &line.category_id,
            &line.item_id,
            &update.sell_unit_id,
        );
        let mut fields = Map::new();
        fields.insert(
            "batchLinks".to_string(),
            serde_json::to_value(&update.links).map_err(|e| AppError::internal(e.to_string()))?,
        );
        self.store.update(&su_path, fields).await?;
        Ok(())
    }
}

fn allocation_error(err: AllocationError, line: &CartLine) -> AppError {
    match err {
        AllocationError::NoBatches => AppError::new(ErrorCode::NoBatches)
            .with_detail("item_id", line.item_id.clone()),
        AllocationError::Insufficient {
            requested,
            available,
        } => AppError::insufficient_stock(requested, available)
            .with_detail("item_id", line.item_id.clone())
            .with_detail("item_type", line.item_type.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn store_with_item() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.insert("shops/s1", json!({"name": "Shop"}));
        store.insert("shops/s1/categories/c1", json!({"name": "Dry Goods"}));
        store.insert(
            &item_path("s1", "c1", "i1"),
            json!({
                "name": "Sugar",
                "stock": 5.0,
                "batches": [
                    { "id": "b1", "batchName": "Jan", "quantity": 2.0, "sellPrice": 10.0, "timestamp": 100 },
                    { "id": "b2", "batchName": "Feb", "quantity": 3.0, "sellPrice": 20.0, "timestamp": 200 }
                ]
            }),
        );
        Arc::new(store)
    }

    fn line(batch_id: Option<&str>, quantity: f64) -> CartLine {
        CartLine {
            item_id: "i1".to_string(),
            category_id: "c1".to_string(),
            batch_id: batch_id.map(|s| s.to_string()),
            quantity,
            unit: "unit".to_string(),
            conversion_factor: 1.0,
            item_type: ItemType::MainItem,
            sell_unit_id: None,
        }
    }

    fn request(items: Vec<CartLine>) -> CompleteSaleRequest {
        CompleteSaleRequest {
            shop_id: "s1".to_string(),
            seller: Some("alice".to_string()),
            items,
        }
    }

    #[tokio::test]
    async fn test_direct_deduction_persists_stock_and_transaction() {
        let store = store_with_item();
        let service = SaleService::new(store.clone());

        let resp = service
            .complete_sale(request(vec![line(Some("b1"), 1.5)]))
            .await
            .unwrap();

        assert!(resp.success);
        assert_eq!(resp.updated_items.len(), 1);
        let outcome = &resp.updated_items[0];
        assert_eq!(outcome.base_units_deducted, 1.5);
        assert_eq!(outcome.remaining_batch_quantity, 0.5);
        assert_eq!(outcome.remaining_total_stock, 3.5);
        assert!(!outcome.batch_exhausted);
        assert_eq!(outcome.total_price, 15.0);

        let doc = store.raw(&item_path("s1", "c1", "i1")).unwrap();
        assert_eq!(doc["stock"], 3.5);
        assert_eq!(doc["batches"][0]["quantity"], 0.5);
        let txns = doc["stockTransactions"].as_array().unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0]["type"], "sale");
        assert_eq!(txns[0]["performedBy"], "alice");
        assert_eq!(doc["lastTransactionId"], txns[0]["id"]);
    }

    #[tokio::test]
    async fn test_selling_unit_conversion_round_trip() {
        // 10 selling units at conversion 5 deduct exactly 2 base units;
        // price = (sell_price / 5) * 10
        let store = store_with_item();
        let service = SaleService::new(store.clone());

        let mut cart = line(Some("b2"), 10.0);
        cart.item_type = ItemType::SellingUnit;
        cart.conversion_factor = 5.0;

        let resp = service.complete_sale(request(vec![cart])).await.unwrap();
        let outcome = &resp.updated_items[0];
        assert_eq!(outcome.base_units_deducted, 2.0);
        assert_eq!(outcome.quantity_sold, 10.0);
        assert_eq!(outcome.total_price, (20.0 / 5.0) * 10.0);

        let doc = store.raw(&item_path("s1", "c1", "i1")).unwrap();
        assert_eq!(doc["batches"][1]["quantity"], 1.0);
        let txn = &doc["stockTransactions"][0];
        assert_eq!(txn["quantity"], 2.0);
        assert_eq!(txn["selling_units_quantity"], 10.0);
        assert_eq!(txn["conversion_factor"], 5.0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejected_without_mutation() {
        let store = store_with_item();
        let before = store.raw(&item_path("s1", "c1", "i1")).unwrap();
        let service = SaleService::new(store.clone());

        let err = service
            .complete_sale(request(vec![line(Some("b1"), 10.0)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        let details = err.details.unwrap();
        assert_eq!(details["requested"], json!(10.0));
        assert_eq!(details["available"], json!(2.0));

        let after = store.raw(&item_path("s1", "c1", "i1")).unwrap();
        assert_eq!(before, after, "a rejected line must not mutate the store");
    }

    #[tokio::test]
    async fn test_fifo_path_walks_batches_in_order() {
        let store = store_with_item();
        let service = SaleService::new(store.clone());

        let resp = service
            .complete_sale(request(vec![line(None, 4.0)]))
            .await
            .unwrap();

        // One outcome per batch touched: 2 from b1 (drained), 2 from b2
        assert_eq!(resp.updated_items.len(), 2);
        assert_eq!(resp.updated_items[0].batch_id, "b1");
        assert_eq!(resp.updated_items[0].base_units_deducted, 2.0);
        assert!(resp.updated_items[0].batch_exhausted);
        assert_eq!(resp.updated_items[1].batch_id, "b2");
        assert_eq!(resp.updated_items[1].base_units_deducted, 2.0);
        assert!(!resp.updated_items[1].batch_exhausted);
        assert_eq!(resp.updated_items[1].remaining_total_stock, 1.0);

        let doc = store.raw(&item_path("s1", "c1", "i1")).unwrap();
        assert_eq!(doc["batches"][0]["quantity"], 0.0);
        assert_eq!(doc["batches"][1]["quantity"], 1.0);
        assert_eq!(doc["stockTransactions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fifo_insufficient_reports_available_and_leaves_store_untouched() {
        let store = store_with_item();
        let before = store.raw(&item_path("s1", "c1", "i1")).unwrap();
        let service = SaleService::new(store.clone());

        let err = service
            .complete_sale(request(vec![line(None, 100.0)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.details.unwrap()["available"], json!(5.0));
        assert_eq!(store.raw(&item_path("s1", "c1", "i1")).unwrap(), before);
    }

    #[tokio::test]
    async fn test_batch_exhaustion_flag_exact_zero_only() {
        let store = store_with_item();
        let service = SaleService::new(store.clone());

        // Drain b1 exactly
        let resp = service
            .complete_sale(request(vec![line(Some("b1"), 2.0)]))
            .await
            .unwrap();
        assert!(resp.updated_items[0].batch_exhausted);

        // Take b2 down to 0.5 - not exhausted
        let resp = service
            .complete_sale(request(vec![line(Some("b2"), 2.5)]))
            .await
            .unwrap();
        assert!(!resp.updated_items[0].batch_exhausted);
        assert_eq!(resp.updated_items[0].remaining_batch_quantity, 0.5);
    }

    #[tokio::test]
    async fn test_missing_item_is_404() {
        let service = SaleService::new(store_with_item());
        let mut bad = line(Some("b1"), 1.0);
        bad.item_id = "missing".to_string();

        let err = service.complete_sale(request(vec![bad])).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ItemNotFound);
        assert_eq!(err.http_status(), http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_batch_is_404() {
        let service = SaleService::new(store_with_item());
        let err = service
            .complete_sale(request(vec![line(Some("nope"), 1.0)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BatchNotFound);
    }

    #[tokio::test]
    async fn test_failure_on_later_line_leaves_earlier_lines_committed() {
        // Known limitation: no cross-line rollback. Line 1 persists, line 2
        // fails, the request errors - and line 1's write stands.
        let store = store_with_item();
        let service = SaleService::new(store.clone());

        let mut missing = line(Some("b1"), 1.0);
        missing.item_id = "missing".to_string();

        let err = service
            .complete_sale(request(vec![line(Some("b1"), 1.0), missing]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ItemNotFound);

        let doc = store.raw(&item_path("s1", "c1", "i1")).unwrap();
        assert_eq!(doc["batches"][0]["quantity"], 1.0, "line 1 remains applied");
        assert_eq!(doc["stockTransactions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_quantity_line_rejected() {
        let service = SaleService::new(store_with_item());
        let err = service
            .complete_sale(request(vec![line(Some("b1"), 0.0)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidQuantity);
    }

    #[tokio::test]
    async fn test_link_allocation_updates_links_and_batches() {
        let store = store_with_item();
        store.insert(
            "shops/s1/categories/c1/items/i1/sellUnits/su1",
            json!({
                "name": "Pack of 2",
                "conversionFactor": 2.0,
                "batchLinks": [
                    { "batchId": "b1", "maxUnitsAvailable": 4.0, "allocatedUnits": 0.0, "pricePerUnit": 6.0, "batchTimestamp": 100 },
                    { "batchId": "b2", "maxUnitsAvailable": 6.0, "allocatedUnits": 0.0, "pricePerUnit": 11.0, "batchTimestamp": 200 }
                ]
            }),
        );
        let service = SaleService::new(store.clone());

        let mut cart = line(None, 6.0);
        cart.item_type = ItemType::SellingUnit;
        cart.conversion_factor = 2.0;
        cart.sell_unit_id = Some("su1".to_string());

        let resp = service.complete_sale(request(vec![cart])).await.unwrap();
        // 4 units from b1 (2 base), 2 units from b2 (1 base)
        assert_eq!(resp.updated_items.len(), 2);
        assert_eq!(resp.updated_items[0].batch_id, "b1");
        assert_eq!(resp.updated_items[0].base_units_deducted, 2.0);
        assert_eq!(resp.updated_items[0].total_price, 4.0 * 6.0);
        assert_eq!(resp.updated_items[1].batch_id, "b2");
        assert_eq!(resp.updated_items[1].base_units_deducted, 1.0);

        let item_doc = store.raw(&item_path("s1", "c1", "i1")).unwrap();
        assert_eq!(item_doc["batches"][0]["quantity"], 0.0);
        assert_eq!(item_doc["batches"][1]["quantity"], 2.0);

        let su_doc = store
            .raw("shops/s1/categories/c1/items/i1/sellUnits/su1")
            .unwrap();
        assert_eq!(su_doc["batchLinks"][0]["allocated_units"], 4.0);
        assert_eq!(su_doc["batchLinks"][1]["allocated_units"], 2.0);
    }

    #[tokio::test]
    async fn test_missing_shop_id_rejected() {
        let service = SaleService::new(store_with_item());
        let mut req = request(vec![line(Some("b1"), 1.0)]);
        req.shop_id = String::new();
        let err = service.complete_sale(req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
    }
}
