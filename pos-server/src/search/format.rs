//! Search result formatting
//!
//! Turns an indexed object into the payload the point-of-sale UI consumes:
//! best-batch resolution for main items, derived availability for selling
//! units, and a coarse `batch_status` tier for both.

use serde::Serialize;
use shared::models::{Batch, FULL_UNIT_EPSILON, SellingUnit};

use super::index::{IndexedObject, MatchType};

/// Minimum derived availability for a selling unit to be sellable
const SELLABLE_UNITS_EPSILON: f64 = 0.000001;

/// Coarse stock tier shown next to each search result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    ActiveHealthy,
    ActiveLowStock,
    Exhausted,
    OutOfStock,
    NoBatches,
}

impl BatchStatus {
    /// Tier for a main item's best batch: >3 healthy, 1-3 low, <1 exhausted
    fn for_main_item(quantity: f64) -> Self {
        if quantity > 3.0 {
            Self::ActiveHealthy
        } else if quantity >= 1.0 {
            Self::ActiveLowStock
        } else {
            Self::Exhausted
        }
    }

    /// Tier for a selling unit's derived availability: >10 healthy, 1-10 low
    fn for_selling_unit(units: f64) -> Self {
        if units > 10.0 {
            Self::ActiveHealthy
        } else if units >= 1.0 {
            Self::ActiveLowStock
        } else {
            Self::OutOfStock
        }
    }
}

/// A formatted search result
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchHit {
    MainItem(MainItemHit),
    SellingUnit(SellingUnitHit),
}

#[derive(Debug, Clone, Serialize)]
pub struct MainItemHit {
    pub item_id: String,
    pub main_item_id: String,
    pub category_id: String,
    pub category_name: String,
    pub name: String,
    pub display_name: String,
    pub thumbnail: Option<String>,
    pub batch_status: BatchStatus,
    pub batch_id: Option<String>,
    pub batch_name: Option<String>,
    pub batch_remaining: f64,
    pub real_available: f64,
    pub price: f64,
    pub base_unit: String,
    pub can_fulfill: bool,
    pub unit_type: &'static str,
    pub search_score: u32,
    pub matched_by: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SellingUnitHit {
    pub item_id: String,
    pub main_item_id: String,
    pub sell_unit_id: String,
    pub category_id: String,
    pub category_name: String,
    pub name: String,
    pub display_name: String,
    pub parent_item_name: String,
    pub thumbnail: Option<String>,
    pub batch_status: BatchStatus,
    pub batch_id: Option<String>,
    pub batch_name: Option<String>,
    pub real_available_units: f64,
    pub price: f64,
    pub available_stock: f64,
    pub conversion_factor: f64,
    pub base_unit: String,
    pub can_fulfill: bool,
    pub has_batch_links: bool,
    pub unit_type: &'static str,
    pub search_score: u32,
    pub matched_by: &'static str,
}

/// Format one scored index object into its response payload
pub fn format_hit(object: &IndexedObject, score: u32, matched_by: MatchType) -> SearchHit {
    match &object.selling_unit {
        None => SearchHit::MainItem(format_main_item(object, score, matched_by)),
        Some(su) => SearchHit::SellingUnit(format_selling_unit(object, su, score, matched_by)),
    }
}

/// The batch a sale would draw from next: earliest by timestamp holding at
/// least one full unit, falling back to the earliest batch of any quantity
fn best_batch(batches: &[Batch]) -> Option<&Batch> {
    let mut sorted: Vec<&Batch> = batches.iter().collect();
    sorted.sort_by_key(|b| b.timestamp);
    sorted
        .iter()
        .find(|b| b.quantity >= FULL_UNIT_EPSILON)
        .copied()
        .or_else(|| sorted.first().copied())
}

fn format_main_item(object: &IndexedObject, score: u32, matched_by: MatchType) -> MainItemHit {
    let item = &object.item;

    match best_batch(&item.batches) {
        Some(batch) => MainItemHit {
            item_id: item.id.clone(),
            main_item_id: item.id.clone(),
            category_id: object.category_id.clone(),
            category_name: object.category_name.clone(),
            name: item.name.clone(),
            display_name: item.name.clone(),
            thumbnail: item.thumbnail.clone(),
            batch_status: BatchStatus::for_main_item(batch.quantity),
            batch_id: Some(batch.id.clone()),
            batch_name: Some(batch.name.clone()),
            batch_remaining: batch.quantity,
            real_available: batch.quantity,
            price: round2(batch.sell_price),
            base_unit: batch.unit.clone(),
            can_fulfill: batch.quantity >= FULL_UNIT_EPSILON,
            unit_type: "base",
            search_score: score,
            matched_by: matched_by.as_str(),
        },
        // Degenerate case: nothing to sell from FIFO
        None => MainItemHit {
            item_id: item.id.clone(),
            main_item_id: item.id.clone(),
            category_id: object.category_id.clone(),
            category_name: object.category_name.clone(),
            name: item.name.clone(),
            display_name: item.name.clone(),
            thumbnail: item.thumbnail.clone(),
            batch_status: BatchStatus::NoBatches,
            batch_id: None,
            batch_name: None,
            batch_remaining: 0.0,
            real_available: 0.0,
            price: 0.0,
            base_unit: item.base_unit.clone(),
            can_fulfill: false,
            unit_type: "base",
            search_score: score,
            matched_by: matched_by.as_str(),
        },
    }
}

fn format_selling_unit(
    object: &IndexedObject,
    su: &SellingUnit,
    score: u32,
    matched_by: MatchType,
) -> SellingUnitHit {
    let item = &object.item;
    let conversion = su.conversion_factor;

    // Derived availability: base-unit quantity converted across all parent
    // batches that still hold anything
    let mut sorted: Vec<&Batch> = item.batches.iter().collect();
    sorted.sort_by_key(|b| b.timestamp);

    let mut available_units = 0.0;
    let mut best: Option<&Batch> = None;
    for batch in &sorted {
        if batch.quantity > 0.0 {
            available_units += batch.quantity * conversion;
            if best.is_none() {
                best = Some(batch);
            }
        }
    }

    let unit_price = match best {
        Some(batch) if conversion > 0.0 => batch.sell_price / conversion,
        _ => 0.0,
    };

    SellingUnitHit {
        item_id: item.id.clone(),
        main_item_id: item.id.clone(),
        sell_unit_id: su.id.clone(),
        category_id: object.category_id.clone(),
        category_name: object.category_name.clone(),
        name: su.name.clone(),
        display_name: su.name.clone(),
        parent_item_name: item.name.clone(),
        thumbnail: su.thumbnail.clone().or_else(|| item.thumbnail.clone()),
        batch_status: BatchStatus::for_selling_unit(available_units),
        batch_id: best.map(|b| b.id.clone()),
        batch_name: best.map(|b| b.name.clone()),
        real_available_units: available_units,
        price: round4(unit_price),
        available_stock: available_units,
        conversion_factor: conversion,
        base_unit: best
            .map(|b| b.unit.clone())
            .unwrap_or_else(|| "unit".to_string()),
        can_fulfill: available_units > SELLABLE_UNITS_EPSILON,
        has_batch_links: su.has_batch_links,
        unit_type: "selling_unit",
        search_score: score,
        matched_by: matched_by.as_str(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
