//! Data models
//!
//! The canonical normalized catalog schema. All field-name coalescing from
//! heterogeneous source documents (camelCase vs. snake_case, missing
//! defaults) happens at the store boundary; these types are what the rest of
//! the system operates on. Serialized form matches the cache wire format
//! (`shop_id`, `item_id`, `batch_name`, ...).

pub mod batch;
pub mod item;
pub mod selling_unit;
pub mod shop;
pub mod transaction;

// Re-exports
pub use batch::*;
pub use item::*;
pub use selling_unit::*;
pub use shop::*;
pub use transaction::*;
