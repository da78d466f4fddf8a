//! Catalog cache
//!
//! [`snapshot`] builds one complete, immutable in-memory copy of the catalog
//! from the document store; [`cache`] owns the current snapshot + search
//! index pair and swaps it atomically on rebuild.

pub mod cache;
pub mod snapshot;

pub use cache::{CacheState, CatalogCache};
pub use snapshot::CatalogSnapshot;
