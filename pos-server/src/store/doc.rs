//! Raw document schemas
//!
//! Source documents are heterogeneous: the same field may appear as
//! `sellPrice` or `sell_price`, numerics may be missing or null, batch ids
//! may be absent entirely. All of that coalescing lives here (serde aliases
//! and defaults) so business logic only ever sees the canonical models.

use serde::Deserialize;
use shared::models::{Batch, BatchLink, Item, SellingUnit};

use crate::utils::now_millis;

/// Shop document fields
#[derive(Debug, Clone, Deserialize)]
pub struct RawShop {
    #[serde(default)]
    pub name: String,
}

/// Category document fields
#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub name: String,
}

/// Batch entry embedded in an item document
#[derive(Debug, Clone, Deserialize)]
pub struct RawBatch {
    #[serde(default, alias = "batch_id")]
    pub id: Option<String>,
    #[serde(default, alias = "batchName", alias = "name")]
    pub batch_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, alias = "buyPrice")]
    pub buy_price: Option<f64>,
    #[serde(default, alias = "sellPrice")]
    pub sell_price: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "addedBy")]
    pub added_by: Option<String>,
}

impl RawBatch {
    /// Normalize into the canonical batch schema
    ///
    /// A missing id is synthesized from the batch timestamp (falling back to
    /// wall-clock millis when that is missing too).
    pub fn normalize(&self) -> Batch {
        let timestamp = self.timestamp.unwrap_or(0);
        let id = match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => {
                let ts = if timestamp > 0 { timestamp } else { now_millis() };
                format!("batch_{}", ts)
            }
        };
        Batch {
            id,
            name: self
                .batch_name
                .clone()
                .unwrap_or_else(|| "Batch".to_string()),
            quantity: self.quantity.unwrap_or(0.0),
            unit: self.unit.clone().unwrap_or_else(|| "unit".to_string()),
            buy_price: self.buy_price.unwrap_or(0.0),
            sell_price: self.sell_price.unwrap_or(0.0),
            timestamp,
            date: self.date.clone().unwrap_or_default(),
            added_by: self.added_by.clone().unwrap_or_default(),
        }
    }
}

/// Batch link entry embedded in a selling-unit document
#[derive(Debug, Clone, Deserialize)]
pub struct RawBatchLink {
    #[serde(default, alias = "batchId")]
    pub batch_id: Option<String>,
    #[serde(default, alias = "maxUnitsAvailable")]
    pub max_units_available: Option<f64>,
    #[serde(default, alias = "allocatedUnits")]
    pub allocated_units: Option<f64>,
    #[serde(default, alias = "pricePerUnit")]
    pub price_per_unit: Option<f64>,
    #[serde(default, alias = "batchTimestamp")]
    pub batch_timestamp: Option<i64>,
}

impl RawBatchLink {
    pub fn normalize(&self) -> BatchLink {
        BatchLink {
            batch_id: self.batch_id.clone().unwrap_or_default(),
            max_units_available: self.max_units_available.unwrap_or(0.0),
            allocated_units: self.allocated_units.unwrap_or(0.0),
            price_per_unit: self.price_per_unit.unwrap_or(0.0),
            batch_timestamp: self.batch_timestamp.unwrap_or(0),
        }
    }
}

/// Selling-unit document fields
#[derive(Debug, Clone, Deserialize)]
pub struct RawSellUnit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "conversionFactor")]
    pub conversion_factor: Option<f64>,
    #[serde(default, alias = "sellPrice")]
    pub sell_price: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, alias = "isBaseUnit")]
    pub is_base_unit: Option<bool>,
    #[serde(default, alias = "batchLinks")]
    pub batch_links: Vec<RawBatchLink>,
}

impl RawSellUnit {
    /// Normalize into the canonical selling-unit schema
    ///
    /// `parent_thumbnail` is the owning item's thumbnail, used when the unit
    /// has no image of its own. A non-positive conversion factor is clamped
    /// to 1 so derived unit prices stay finite.
    pub fn normalize(&self, id: &str, parent_thumbnail: Option<&str>) -> SellingUnit {
        let batch_links: Vec<BatchLink> = self.batch_links.iter().map(|l| l.normalize()).collect();
        let total_units_available = batch_links.iter().map(|l| l.available_units()).sum();
        let conversion_factor = match self.conversion_factor {
            Some(cf) if cf > 0.0 => cf,
            _ => 1.0,
        };
        SellingUnit {
            id: id.to_string(),
            name: self.name.clone().unwrap_or_default(),
            conversion_factor,
            sell_price: self.sell_price.unwrap_or(0.0),
            thumbnail: self
                .images
                .first()
                .cloned()
                .or_else(|| parent_thumbnail.map(|t| t.to_string())),
            is_base_unit: self.is_base_unit.unwrap_or(false),
            has_batch_links: !batch_links.is_empty(),
            total_units_available,
            batch_links,
        }
    }
}

/// Item document fields
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, alias = "sellPrice")]
    pub sell_price: Option<f64>,
    #[serde(default, alias = "buyPrice")]
    pub buy_price: Option<f64>,
    #[serde(default)]
    pub stock: Option<f64>,
    #[serde(default, alias = "baseUnit")]
    pub base_unit: Option<String>,
    #[serde(default)]
    pub batches: Vec<RawBatch>,
    #[serde(default, alias = "stockTransactions")]
    pub stock_transactions: Vec<serde_json::Value>,
}

impl RawItem {
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(|s| s.as_str())
    }

    /// Normalize into the canonical item schema
    ///
    /// `effective_stock` prefers the sum of batch quantities; an item without
    /// batch stock falls back to the stored scalar field.
    pub fn normalize(
        &self,
        id: &str,
        category_id: &str,
        category_name: &str,
        selling_units: Vec<SellingUnit>,
    ) -> Item {
        let batches: Vec<Batch> = self.batches.iter().map(|b| b.normalize()).collect();
        let total_stock_from_batches: f64 = batches.iter().map(|b| b.quantity).sum();
        let stored_stock = self.stock.unwrap_or(0.0);
        let effective_stock = if total_stock_from_batches > 0.0 {
            total_stock_from_batches
        } else {
            stored_stock
        };

        Item {
            id: id.to_string(),
            name: self.name.clone(),
            thumbnail: self.thumbnail().map(|t| t.to_string()),
            sell_price: self.sell_price.unwrap_or(0.0),
            buy_price: self.buy_price.unwrap_or(0.0),
            stock: effective_stock,
            base_unit: self.base_unit.clone().unwrap_or_else(|| "unit".to_string()),
            has_batches: !batches.is_empty(),
            total_stock_from_batches,
            batches,
            selling_units,
            category_id: category_id.to_string(),
            category_name: category_name.to_string(),
        }
    }
}
