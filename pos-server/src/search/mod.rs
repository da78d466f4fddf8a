//! Keyword search over the catalog
//!
//! The index trades memory for O(1) average lookup on exact-word and prefix
//! queries; search runs on every keystroke in the point-of-sale UI, so this
//! is the hot read path.

pub mod format;
pub mod index;

pub use format::{BatchStatus, MainItemHit, SearchHit, SellingUnitHit};
pub use index::{IndexedObject, MatchType, ScoreConfig, SearchIndex};
