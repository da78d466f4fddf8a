//! Shop and Category Models

use serde::{Deserialize, Serialize};

use super::item::Item;

/// Category entity
///
/// Never materialized empty: a category with zero items is dropped from the
/// snapshot during the build, so downstream code may assume at least one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "category_id")]
    pub id: String,
    #[serde(rename = "category_name")]
    pub name: String,
    pub items: Vec<Item>,
}

/// Shop entity - the multi-tenant scoping root
///
/// Created wholesale on each snapshot build; never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    #[serde(rename = "shop_id")]
    pub id: String,
    #[serde(rename = "shop_name")]
    pub name: String,
    pub categories: Vec<Category>,
}
