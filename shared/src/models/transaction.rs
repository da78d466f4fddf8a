//! Stock Transaction Model

use serde::{Deserialize, Serialize};

use super::item::ItemType;

/// Immutable record of a stock mutation, appended to the item's transaction
/// history when a sale line is applied
///
/// Serialized field names match the persisted document format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: String,
    /// Always "sale" for records produced by the sale workflow
    #[serde(rename = "type")]
    pub txn_type: String,
    pub item_type: ItemType,
    #[serde(rename = "batchId")]
    pub batch_id: String,
    /// Base units deducted from the batch
    pub quantity: f64,
    /// Selling-unit quantity as entered by the seller (selling units only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_units_quantity: Option<f64>,
    pub unit: String,
    #[serde(rename = "sellPrice")]
    pub sell_price: f64,
    #[serde(rename = "unitPrice")]
    pub unit_price: f64,
    #[serde(rename = "totalPrice")]
    pub total_price: f64,
    /// Epoch seconds
    pub timestamp: i64,
    #[serde(rename = "performedBy", skip_serializing_if = "Option::is_none")]
    pub performed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_factor: Option<f64>,
}
