//! Document store boundary
//!
//! The catalog lives in an external document store organized as
//! `shops/{shop}/categories/{category}/items/{item}` with a `sellUnits`
//! subcollection per item. The core only needs four operations from it:
//!
//! - [`DocStore::stream_all`] - full-collection read, once per rebuild level
//! - [`DocStore::subscribe`] - change notifications per collection group
//! - [`DocStore::get`] / [`DocStore::update`] - point read / partial write
//!   used by the sale workflow
//!
//! [`doc`] holds the raw document schemas and is the single translation
//! layer between heterogeneous source field names and the canonical models.

pub mod doc;
pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared::{AppError, ErrorCode};
use thiserror::Error;
use tokio::sync::broadcast;

pub use memory::MemoryStore;

/// Collection group name for items (subscription key)
pub const ITEMS_GROUP: &str = "items";
/// Collection group name for selling units (subscription key)
pub const SELL_UNITS_GROUP: &str = "sellUnits";

/// Errors surfaced by the document store boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("malformed document at {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(path) => {
                AppError::with_message(ErrorCode::NotFound, format!("Document {} not found", path))
            }
            other => AppError::upstream(other.to_string()),
        }
    }
}

/// A document read from the store: its id within the collection plus fields
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Deserialize the document fields into a typed raw schema
    pub fn parse<T: DeserializeOwned>(&self, path: &str) -> StoreResult<T> {
        serde_json::from_value(self.data.clone()).map_err(|source| StoreError::Malformed {
            path: path.to_string(),
            source,
        })
    }
}

/// Kind of change carried by a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Change notification emitted for a collection group
///
/// The cache treats every event as "rebuild everything"; the payload exists
/// for logging only.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub group: String,
    pub path: String,
    pub kind: ChangeKind,
}

/// Abstract document store contract
#[async_trait]
pub trait DocStore: Send + Sync {
    /// Read every document directly under a collection path
    async fn stream_all(&self, collection_path: &str) -> StoreResult<Vec<Document>>;

    /// Subscribe to change notifications for a collection group
    fn subscribe(&self, collection_group: &str) -> broadcast::Receiver<ChangeEvent>;

    /// Point-read a single document
    async fn get(&self, document_path: &str) -> StoreResult<Option<Document>>;

    /// Merge partial fields into an existing document and notify subscribers
    async fn update(&self, document_path: &str, fields: Map<String, Value>) -> StoreResult<()>;
}

// ==================== Path helpers ====================

pub fn shops_path() -> String {
    "shops".to_string()
}

pub fn categories_path(shop_id: &str) -> String {
    format!("shops/{}/categories", shop_id)
}

pub fn items_path(shop_id: &str, category_id: &str) -> String {
    format!("shops/{}/categories/{}/items", shop_id, category_id)
}

pub fn item_path(shop_id: &str, category_id: &str, item_id: &str) -> String {
    format!("shops/{}/categories/{}/items/{}", shop_id, category_id, item_id)
}

pub fn sell_units_path(shop_id: &str, category_id: &str, item_id: &str) -> String {
    format!(
        "shops/{}/categories/{}/items/{}/sellUnits",
        shop_id, category_id, item_id
    )
}

pub fn sell_unit_path(shop_id: &str, category_id: &str, item_id: &str, sell_unit_id: &str) -> String {
    format!(
        "shops/{}/categories/{}/items/{}/sellUnits/{}",
        shop_id, category_id, item_id, sell_unit_id
    )
}
