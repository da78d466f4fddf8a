//! Item Model

use serde::{Deserialize, Serialize};

use super::batch::Batch;
use super::selling_unit::SellingUnit;

/// Whether a cart line or transaction refers to a main item or one of its
/// selling units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    MainItem,
    SellingUnit,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::MainItem => "main_item",
            ItemType::SellingUnit => "selling_unit",
        }
    }
}

/// Main item entity
///
/// Invariant: `stock == sum(batch.quantity)` whenever `batches` is non-empty;
/// otherwise `stock` falls back to the stored scalar field. An item with zero
/// batches is a degenerate case and cannot be sold through FIFO allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "item_id")]
    pub id: String,
    pub name: String,
    /// First image of the source document, if any
    pub thumbnail: Option<String>,
    pub sell_price: f64,
    pub buy_price: f64,
    /// Effective stock in base units (see invariant above)
    pub stock: f64,
    pub base_unit: String,
    #[serde(default)]
    pub batches: Vec<Batch>,
    pub has_batches: bool,
    pub total_stock_from_batches: f64,
    #[serde(default)]
    pub selling_units: Vec<SellingUnit>,

    // -- Owning scope back-references (for scoping, not ownership) --
    pub category_id: String,
    pub category_name: String,
}
