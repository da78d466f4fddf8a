//! Selling Unit Model

use serde::{Deserialize, Serialize};

/// Association between a selling unit and a specific batch
///
/// Pre-allocates selling-unit availability per batch. Invariant:
/// `0 <= allocated_units <= max_units_available`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchLink {
    pub batch_id: String,
    pub max_units_available: f64,
    pub allocated_units: f64,
    pub price_per_unit: f64,
    /// Timestamp of the linked batch - the FIFO ordering key
    pub batch_timestamp: i64,
}

impl BatchLink {
    /// Units still available through this link
    pub fn available_units(&self) -> f64 {
        self.max_units_available - self.allocated_units
    }
}

/// An alternate sale denomination of a base item (e.g. "case of 12")
///
/// A selling unit has no stock of its own; availability is always derived
/// from the parent item's batches, either via `quantity * conversion_factor`
/// or via explicit batch links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellingUnit {
    #[serde(rename = "sell_unit_id")]
    pub id: String,
    pub name: String,
    /// Base units per one selling unit (> 0)
    pub conversion_factor: f64,
    pub sell_price: f64,
    /// Falls back to the parent item's thumbnail when absent
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub is_base_unit: bool,
    #[serde(default)]
    pub batch_links: Vec<BatchLink>,
    /// Sum of `(max_units_available - allocated_units)` across batch links
    pub total_units_available: f64,
    pub has_batch_links: bool,
}
