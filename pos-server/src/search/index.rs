//! In-memory search index
//!
//! Two maps built per snapshot: an exact-word index (token → scored entries)
//! and a prefix index (every non-empty prefix of every token → item keys).
//! The index is built alongside a snapshot and replaced with it; it is never
//! mutated after construction.

use chrono::{DateTime, Utc};
use shared::models::{Item, ItemType, SellingUnit, Shop};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::format::{self, SearchHit};

/// Ranking constants
///
/// Kept as configuration rather than inline literals so ranking can be tuned
/// without touching the index-walk logic.
#[derive(Debug, Clone, Copy)]
pub struct ScoreConfig {
    /// Exact word match on a main item name
    pub exact_item: u32,
    /// Exact word match on a selling-unit name
    pub exact_selling_unit: u32,
    /// Prefix match on either
    pub prefix: u32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            exact_item: 100,
            exact_selling_unit: 95,
            prefix: 70,
        }
    }
}

/// How a result matched the query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    ExactWord,
    Prefix,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::ExactWord => "exact_word",
            MatchType::Prefix => "prefix",
        }
    }
}

/// One indexed object: a main item or one of its selling units, denormalized
/// with its owning scope
#[derive(Debug)]
pub struct IndexedObject {
    pub key: String,
    pub item_type: ItemType,
    pub shop_id: String,
    pub shop_name: String,
    pub category_id: String,
    pub category_name: String,
    /// The main item (parent item for selling units; carries the batches)
    pub item: Item,
    pub selling_unit: Option<SellingUnit>,
}

impl IndexedObject {
    /// The id used for de-duplication across exact and prefix matches
    pub fn unit_id(&self) -> &str {
        match &self.selling_unit {
            Some(su) => &su.id,
            None => &self.item.id,
        }
    }
}

#[derive(Debug, Clone)]
struct WordEntry {
    score: u32,
    object: Arc<IndexedObject>,
}

/// Search index over one catalog snapshot
#[derive(Debug)]
pub struct SearchIndex {
    word_index: HashMap<String, Vec<WordEntry>>,
    /// prefix → item keys, insertion-ordered for stable results
    prefix_index: HashMap<String, Vec<String>>,
    objects: HashMap<String, Arc<IndexedObject>>,
    scores: ScoreConfig,
    pub built_at: Option<DateTime<Utc>>,
    pub total_items: usize,
    pub total_selling_units: usize,
}

impl SearchIndex {
    /// An index over nothing (cache not yet populated)
    pub fn empty() -> Self {
        Self {
            word_index: HashMap::new(),
            prefix_index: HashMap::new(),
            objects: HashMap::new(),
            scores: ScoreConfig::default(),
            built_at: None,
            total_items: 0,
            total_selling_units: 0,
        }
    }

    /// Build a fresh index from a snapshot's shops
    pub fn build(shops: &[Shop], scores: ScoreConfig) -> Self {
        let mut index = Self {
            scores,
            ..Self::empty()
        };

        for shop in shops {
            for category in &shop.categories {
                for item in &category.items {
                    index.total_items += 1;

                    let item_key = format!("item_{}_{}", shop.id, item.id);
                    let object = Arc::new(IndexedObject {
                        key: item_key.clone(),
                        item_type: ItemType::MainItem,
                        shop_id: shop.id.clone(),
                        shop_name: shop.name.clone(),
                        category_id: category.id.clone(),
                        category_name: category.name.clone(),
                        item: item.clone(),
                        selling_unit: None,
                    });
                    index.objects.insert(item_key.clone(), object.clone());
                    index.add_text(&item.name, scores.exact_item, &item_key, &object);

                    for su in &item.selling_units {
                        index.total_selling_units += 1;

                        let su_key = format!("su_{}_{}_{}", shop.id, item.id, su.id);
                        let su_object = Arc::new(IndexedObject {
                            key: su_key.clone(),
                            item_type: ItemType::SellingUnit,
                            shop_id: shop.id.clone(),
                            shop_name: shop.name.clone(),
                            category_id: category.id.clone(),
                            category_name: category.name.clone(),
                            item: item.clone(),
                            selling_unit: Some(su.clone()),
                        });
                        index.objects.insert(su_key.clone(), su_object.clone());
                        index.add_text(&su.name, scores.exact_selling_unit, &su_key, &su_object);
                    }
                }
            }
        }

        index.built_at = Some(Utc::now());
        tracing::debug!(
            items = index.total_items,
            selling_units = index.total_selling_units,
            keywords = index.word_index.len(),
            prefixes = index.prefix_index.len(),
            "Search index built"
        );
        index
    }

    /// Tokenize `text` and register every token and token prefix
    ///
    /// A blank name contributes nothing. No stemming, no stop words; score is
    /// a fixed constant per field type.
    fn add_text(&mut self, text: &str, score: u32, key: &str, object: &Arc<IndexedObject>) {
        if text.trim().is_empty() {
            return;
        }

        for word in text.to_lowercase().split_whitespace() {
            self.word_index
                .entry(word.to_string())
                .or_default()
                .push(WordEntry {
                    score,
                    object: object.clone(),
                });

            // Every non-empty prefix, including the full word
            for (i, _) in word.char_indices().skip(1) {
                self.register_prefix(&word[..i], key);
            }
            self.register_prefix(word, key);
        }
    }

    fn register_prefix(&mut self, prefix: &str, key: &str) {
        let keys = self.prefix_index.entry(prefix.to_string()).or_default();
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }

    /// Number of distinct keywords in the word index
    pub fn keyword_count(&self) -> usize {
        self.word_index.len()
    }

    /// Number of registered prefixes
    pub fn prefix_count(&self) -> usize {
        self.prefix_index.len()
    }

    /// Search the index
    ///
    /// Queries shorter than 2 characters return nothing. `shop_scope` is the
    /// multi-tenant isolation boundary: when set, results are limited to that
    /// shop by id equality. Exact-word matches keep their stored score;
    /// prefix matches score [`ScoreConfig::prefix`]. Results are de-duplicated
    /// by unit id (first occurrence wins, so exact beats prefix), sorted by
    /// score descending (stable), truncated to `limit`, then formatted.
    pub fn search(&self, query: &str, shop_scope: Option<&str>, limit: usize) -> Vec<SearchHit> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < 2 {
            return Vec::new();
        }

        let in_scope = |object: &IndexedObject| match shop_scope {
            Some(shop_id) => object.shop_id == shop_id,
            None => true,
        };

        let mut seen: HashSet<&str> = HashSet::new();
        let mut combined: Vec<(u32, MatchType, Arc<IndexedObject>)> = Vec::new();

        // Exact word matches first so they win de-duplication
        if let Some(entries) = self.word_index.get(&query) {
            for entry in entries {
                if !in_scope(&entry.object) {
                    continue;
                }
                if seen.insert(entry.object.unit_id()) {
                    combined.push((entry.score, MatchType::ExactWord, entry.object.clone()));
                }
            }
        }

        // Prefix matches at a flat score (exact prefix-string lookup, not a
        // substring scan)
        if let Some(keys) = self.prefix_index.get(&query) {
            for key in keys {
                let Some(object) = self.objects.get(key) else {
                    continue;
                };
                if !in_scope(object) {
                    continue;
                }
                if seen.insert(object.unit_id()) {
                    combined.push((self.scores.prefix, MatchType::Prefix, object.clone()));
                }
            }
        }

        // Stable sort keeps insertion order within equal scores
        combined.sort_by(|a, b| b.0.cmp(&a.0));
        combined.truncate(limit);

        combined
            .into_iter()
            .map(|(score, matched_by, object)| format::format_hit(&object, score, matched_by))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Batch, Category};

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

    fn item(id: &str, name: &str, batches: Vec<Batch>, selling_units: Vec<SellingUnit>) -> Item {
        let total: f64 = batches.iter().map(|b| b.quantity).sum();
        Item {
            id: id.to_string(),
            name: name.to_string(),
            thumbnail: None,
            sell_price: 0.0,
            buy_price: 0.0,
            stock: total,
            base_unit: "unit".to_string(),
            has_batches: !batches.is_empty(),
            total_stock_from_batches: total,
            batches,
            selling_units,
            category_id: "c1".to_string(),
            category_name: "General".to_string(),
        }
    }

    fn shop(id: &str, items: Vec<Item>) -> Shop {
        Shop {
            id: id.to_string(),
            name: format!("Shop {}", id),
            categories: vec![Category {
                id: "c1".to_string(),
                name: "General".to_string(),
                items,
            }],
        }
    }

    fn sugar_shop(shop_id: &str) -> Shop {
        sugar_shop_with_item(shop_id, "i1")
    }

    // Item ids are globally unique document ids in the source store
    fn sugar_shop_with_item(shop_id: &str, item_id: &str) -> Shop {
        shop(
            shop_id,
            vec![item(
                item_id,
                "Sugar",
                vec![batch("b1", 5.0, 120.0, 100)],
                vec![],
            )],
        )
    }

    fn search_scores(hits: &[SearchHit]) -> Vec<u32> {
        hits.iter()
            .map(|h| match h {
                SearchHit::MainItem(m) => m.search_score,
                SearchHit::SellingUnit(s) => s.search_score,
            })
            .collect()
    }

    #[test]
    fn test_exact_word_scores_100() {
        let index = SearchIndex::build(&[sugar_shop("s1")], ScoreConfig::default());
        let hits = index.search("sugar", Some("s1"), 50);
        assert_eq!(hits.len(), 1);
        assert_eq!(search_scores(&hits), vec![100]);
    }

    #[test]
    fn test_prefix_scores_70() {
        let index = SearchIndex::build(&[sugar_shop("s1")], ScoreConfig::default());
        let hits = index.search("sug", Some("s1"), 50);
        assert_eq!(hits.len(), 1);
        assert_eq!(search_scores(&hits), vec![70]);
    }

    #[test]
    fn test_short_query_returns_empty() {
        let index = SearchIndex::build(&[sugar_shop("s1")], ScoreConfig::default());
        assert!(index.search("s", Some("s1"), 50).is_empty());
        assert!(index.search("  s  ", Some("s1"), 50).is_empty());
    }

    #[test]
    fn test_shop_scoping_isolates_tenants() {
        // Identical item names across two shops, distinct item ids
        let index = SearchIndex::build(
            &[
                sugar_shop_with_item("shop_a", "i1"),
                sugar_shop_with_item("shop_b", "i2"),
            ],
            ScoreConfig::default(),
        );

        let hits = index.search("sugar", Some("shop_a"), 50);
        assert_eq!(hits.len(), 1);
        match &hits[0] {
            SearchHit::MainItem(m) => assert_eq!(m.item_id, "i1"),
            _ => panic!("expected main item"),
        }

        // Unscoped sees both
        assert_eq!(index.search("sugar", None, 50).len(), 2);
    }

    #[test]
    fn test_dedup_by_unit_id_spans_shops() {
        // The dedup key is the bare unit id; two shops sharing an item id
        // collapse to one unscoped hit (first indexed wins)
        let index = SearchIndex::build(
            &[
                sugar_shop_with_item("shop_a", "i1"),
                sugar_shop_with_item("shop_b", "i1"),
            ],
            ScoreConfig::default(),
        );

        assert_eq!(index.search("sugar", None, 50).len(), 1);
        // Scoping still reaches each shop on its own
        assert_eq!(index.search("sugar", Some("shop_b"), 50).len(), 1);
    }

    #[test]
    fn test_exact_wins_dedup_over_prefix() {
        // "sugar" is both an exact word and a prefix of itself; the result
        // must keep the exact-word score
        let index = SearchIndex::build(&[sugar_shop("s1")], ScoreConfig::default());
        let hits = index.search("sugar", Some("s1"), 50);
        assert_eq!(search_scores(&hits), vec![100]);
    }

    #[test]
    fn test_selling_unit_indexed_at_95() {
        let su = SellingUnit {
            id: "su1".to_string(),
            name: "Kasuku Tin".to_string(),
            conversion_factor: 2.0,
            sell_price: 70.0,
            thumbnail: None,
            is_base_unit: false,
            batch_links: vec![],
            total_units_available: 0.0,
            has_batch_links: false,
        };
        let shops = vec![shop(
            "s1",
            vec![item(
                "i1",
                "Sugar",
                vec![batch("b1", 5.0, 120.0, 100)],
                vec![su],
            )],
        )];
        let index = SearchIndex::build(&shops, ScoreConfig::default());

        let hits = index.search("kasuku", Some("s1"), 50);
        assert_eq!(search_scores(&hits), vec![95]);
        match &hits[0] {
            SearchHit::SellingUnit(s) => {
                assert_eq!(s.sell_unit_id, "su1");
                assert_eq!(s.parent_item_name, "Sugar");
            }
            _ => panic!("expected selling unit"),
        }
    }

    #[test]
    fn test_results_sorted_by_score_and_limited() {
        // "su" prefixes both "sugar" and "sukuma"; exact "sugar" outranks
        let shops = vec![shop(
            "s1",
            vec![
                item("i1", "Sugar", vec![batch("b1", 5.0, 120.0, 100)], vec![]),
                item("i2", "Sukuma Wiki", vec![batch("b2", 5.0, 30.0, 100)], vec![]),
            ],
        )];
        let index = SearchIndex::build(&shops, ScoreConfig::default());

        let hits = index.search("su", Some("s1"), 50);
        assert_eq!(hits.len(), 2);
        assert_eq!(search_scores(&hits), vec![70, 70]);

        let limited = index.search("su", Some("s1"), 1);
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_blank_name_not_indexed() {
        let shops = vec![shop(
            "s1",
            vec![item("i1", "   ", vec![], vec![])],
        )];
        let index = SearchIndex::build(&shops, ScoreConfig::default());
        assert_eq!(index.keyword_count(), 0);
    }

    #[test]
    fn test_multi_word_names_tokenized() {
        let shops = vec![shop(
            "s1",
            vec![item("i1", "Brown Sugar", vec![batch("b1", 5.0, 1.0, 1)], vec![])],
        )];
        let index = SearchIndex::build(&shops, ScoreConfig::default());
        assert_eq!(index.search("brown", Some("s1"), 50).len(), 1);
        assert_eq!(index.search("sugar", Some("s1"), 50).len(), 1);
    }
}
