//! FIFO batch allocation
//!
//! Satisfies a requested quantity by draining the oldest batches first.
//! Allocations are line-itemized per batch rather than priced at a flat
//! average, because different batches may have been bought and priced
//! differently.
//!
//! The allocator does not validate the requested quantity itself (a zero or
//! negative request simply allocates nothing); that is the caller's job.

use shared::models::{Batch, BatchLink};
use thiserror::Error;

/// Allocation failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    #[error("no batches available")]
    NoBatches,
    #[error("insufficient stock: only {available} of {requested} available")]
    Insufficient { requested: f64, available: f64 },
}

/// One batch's contribution to an allocation
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationLine {
    pub batch_id: String,
    pub batch_name: Option<String>,
    /// Quantity taken, in the requested denomination (base units for main
    /// items, selling units for selling-unit allocations)
    pub quantity: f64,
    /// Base-unit equivalent of `quantity`
    pub base_units: f64,
    /// Price per one of the requested denomination at this batch
    pub unit_price: f64,
    pub line_total: f64,
    pub unit: String,
}

/// A successful allocation across one or more batches
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub lines: Vec<AllocationLine>,
    pub total_price: f64,
}

/// Allocate base units from an item's batches, oldest first
pub fn allocate_main_item(batches: &[Batch], requested: f64) -> Result<Allocation, AllocationError> {
    if batches.is_empty() {
        return Err(AllocationError::NoBatches);
    }

    let mut sorted: Vec<&Batch> = batches.iter().collect();
    sorted.sort_by_key(|b| b.timestamp);

    let mut lines = Vec::new();
    let mut remaining = requested;
    let mut total_price = 0.0;

    for batch in sorted {
        if remaining <= 0.0 {
            break;
        }
        let available = batch.quantity;
        if available > 0.0 {
            let take = available.min(remaining);
            lines.push(AllocationLine {
                batch_id: batch.id.clone(),
                batch_name: Some(batch.name.clone()),
                quantity: take,
                base_units: take,
                unit_price: batch.sell_price,
                line_total: take * batch.sell_price,
                unit: batch.unit.clone(),
            });
            total_price += take * batch.sell_price;
            remaining -= take;
        }
    }

    if remaining > 0.0 {
        return Err(AllocationError::Insufficient {
            requested,
            available: requested - remaining,
        });
    }

    Ok(Allocation { lines, total_price })
}

/// Allocate selling units from a unit's batch links, oldest batch first
///
/// Availability per link is `max_units_available - allocated_units`; each
/// line also records the base-unit equivalent (`units / conversion_factor`)
/// so the caller can reconcile the parent item's base stock.
pub fn allocate_selling_unit(
    batch_links: &[BatchLink],
    requested_units: f64,
    conversion_factor: f64,
) -> Result<Allocation, AllocationError> {
    if batch_links.is_empty() {
        return Err(AllocationError::NoBatches);
    }

    let mut sorted: Vec<&BatchLink> = batch_links.iter().collect();
    sorted.sort_by_key(|l| l.batch_timestamp);

    let mut lines = Vec::new();
    let mut remaining_units = requested_units;
    let mut total_price = 0.0;

    for link in sorted {
        if remaining_units <= 0.0 {
            break;
        }
        let available_units = link.available_units();
        if available_units > 0.0 {
            let take_units = available_units.min(remaining_units);
            lines.push(AllocationLine {
                batch_id: link.batch_id.clone(),
                batch_name: None,
                quantity: take_units,
                base_units: take_units / conversion_factor,
                unit_price: link.price_per_unit,
                line_total: take_units * link.price_per_unit,
                unit: "unit".to_string(),
            });
            total_price += take_units * link.price_per_unit;
            remaining_units -= take_units;
        }
    }

    if remaining_units > 0.0 {
        return Err(AllocationError::Insufficient {
            requested: requested_units,
            available: requested_units - remaining_units,
        });
    }

    Ok(Allocation { lines, total_price })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(id: &str, quantity: f64, sell_price: f64, timestamp: i64) -> Batch {
        Batch {
            id: id.to_string(),
            name: format!("Batch {}", id),
            quantity,
            unit: "unit".to_string(),
            buy_price: 0.0,
            sell_price,
            timestamp,
            date: String::new(),
            added_by: String::new(),
        }
    }

    fn link(batch_id: &str, max: f64, allocated: f64, price: f64, timestamp: i64) -> BatchLink {
        BatchLink {
            batch_id: batch_id.to_string(),
            max_units_available: max,
            allocated_units: allocated,
            price_per_unit: price,
            batch_timestamp: timestamp,
        }
    }

    #[test]
    fn test_fifo_drains_oldest_first() {
        // Quantities [2, 3, 5] at t1 < t2 < t3; requesting 4 must touch only
        // the first two batches
        let batches = vec![
            batch("b3", 5.0, 30.0, 300),
            batch("b1", 2.0, 10.0, 100),
            batch("b2", 3.0, 20.0, 200),
        ];

        let allocation = allocate_main_item(&batches, 4.0).unwrap();
        assert_eq!(allocation.lines.len(), 2);
        assert_eq!(allocation.lines[0].batch_id, "b1");
        assert_eq!(allocation.lines[0].quantity, 2.0);
        assert_eq!(allocation.lines[1].batch_id, "b2");
        assert_eq!(allocation.lines[1].quantity, 2.0);
        // 2 * 10 + 2 * 20, not a flat average
        assert_eq!(allocation.total_price, 60.0);
    }

    #[test]
    fn test_insufficient_reports_available() {
        let batches = vec![batch("b1", 1.5, 10.0, 100), batch("b2", 2.5, 20.0, 200)];
        let err = allocate_main_item(&batches, 100.0).unwrap_err();
        assert_eq!(
            err,
            AllocationError::Insufficient {
                requested: 100.0,
                available: 4.0
            }
        );
    }

    #[test]
    fn test_no_batches() {
        assert_eq!(allocate_main_item(&[], 1.0), Err(AllocationError::NoBatches));
    }

    #[test]
    fn test_zero_quantity_batches_skipped() {
        let batches = vec![batch("b1", 0.0, 10.0, 100), batch("b2", 5.0, 20.0, 200)];
        let allocation = allocate_main_item(&batches, 3.0).unwrap();
        assert_eq!(allocation.lines.len(), 1);
        assert_eq!(allocation.lines[0].batch_id, "b2");
    }

    #[test]
    fn test_zero_request_allocates_nothing() {
        // Not validated here; the allocator simply returns an empty allocation
        let batches = vec![batch("b1", 5.0, 10.0, 100)];
        let allocation = allocate_main_item(&batches, 0.0).unwrap();
        assert!(allocation.lines.is_empty());
        assert_eq!(allocation.total_price, 0.0);
    }

    #[test]
    fn test_selling_unit_fifo_and_base_units() {
        let links = vec![
            link("b2", 12.0, 0.0, 9.5, 200),
            link("b1", 20.0, 16.0, 9.0, 100),
        ];

        // 10 units, conversion 4: 4 from b1 (oldest, 4 left), 6 from b2
        let allocation = allocate_selling_unit(&links, 10.0, 4.0).unwrap();
        assert_eq!(allocation.lines.len(), 2);
        assert_eq!(allocation.lines[0].batch_id, "b1");
        assert_eq!(allocation.lines[0].quantity, 4.0);
        assert_eq!(allocation.lines[0].base_units, 1.0);
        assert_eq!(allocation.lines[1].batch_id, "b2");
        assert_eq!(allocation.lines[1].quantity, 6.0);
        assert_eq!(allocation.lines[1].base_units, 1.5);
        assert_eq!(allocation.total_price, 4.0 * 9.0 + 6.0 * 9.5);
    }

    #[test]
    fn test_selling_unit_insufficient() {
        let links = vec![link("b1", 5.0, 2.0, 9.0, 100)];
        let err = allocate_selling_unit(&links, 10.0, 4.0).unwrap_err();
        assert_eq!(
            err,
            AllocationError::Insufficient {
                requested: 10.0,
                available: 3.0
            }
        );
    }
}
