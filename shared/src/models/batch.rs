//! Batch Model

use serde::{Deserialize, Serialize};

/// Threshold for treating a batch as holding at least one full unit.
///
/// Repeated float subtraction can leave a remaining quantity numerically just
/// below an integral value (e.g. 0.9999999999 after selling from a batch of
/// 3), so "has a unit of stock" is tested against this epsilon instead of 1.0.
pub const FULL_UNIT_EPSILON: f64 = 0.999999;

/// A priced lot of stock for an item, FIFO-ordered by creation timestamp
///
/// Batches are immutable snapshots inside the cache between rebuilds; the
/// cached `quantity` is stale the instant a sale completes elsewhere and is
/// reconciled by the next change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    #[serde(rename = "batch_id")]
    pub id: String,
    #[serde(rename = "batch_name")]
    pub name: String,
    /// Remaining quantity in base units (>= 0)
    pub quantity: f64,
    /// Base unit label, e.g. "kg" or "unit"
    pub unit: String,
    pub buy_price: f64,
    pub sell_price: f64,
    /// Creation timestamp in epoch milliseconds - the FIFO ordering key
    pub timestamp: i64,
    #[serde(default)]
    pub date: String,
    /// Source attribution (who added the batch)
    #[serde(default)]
    pub added_by: String,
}

impl Batch {
    /// Whether this batch still holds at least one full base unit
    pub fn has_full_unit(&self) -> bool {
        self.quantity >= FULL_UNIT_EPSILON
    }
}
