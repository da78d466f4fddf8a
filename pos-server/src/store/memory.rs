//! In-memory document store
//!
//! Backs the server when no external store is wired up (development, tests).
//! Documents are kept in a flat path → fields map; `update` merges partial
//! fields and broadcasts a change event for the document's collection group,
//! which is what drives cache rebuilds.

use dashmap::DashMap;
use serde_json::{Map, Value};
use std::path::Path;
use tokio::sync::broadcast;

use super::{ChangeEvent, ChangeKind, DocStore, Document, StoreError, StoreResult};
use async_trait::async_trait;

const CHANNEL_CAPACITY: usize = 64;

/// In-memory [`DocStore`] implementation
#[derive(Debug)]
pub struct MemoryStore {
    docs: DashMap<String, Value>,
    channels: DashMap<String, broadcast::Sender<ChangeEvent>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            docs: DashMap::new(),
            channels: DashMap::new(),
        }
    }

    /// Load documents from a JSON seed file: a flat object mapping document
    /// paths to their fields. Returns the number of documents loaded.
    pub fn seed_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let map: Map<String, Value> = serde_json::from_str(&raw)?;
        let store = Self::new();
        for (doc_path, fields) in map {
            store.docs.insert(doc_path, fields);
        }
        Ok(store)
    }

    /// Insert (or replace) a document and notify subscribers
    ///
    /// Not part of the [`DocStore`] contract; catalog edits arrive through
    /// this in tests and seeding.
    pub fn insert(&self, document_path: &str, fields: Value) {
        self.docs.insert(document_path.to_string(), fields);
        self.notify(document_path, ChangeKind::Created);
    }

    /// Number of documents held
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Raw read used by tests to assert persisted state
    pub fn raw(&self, document_path: &str) -> Option<Value> {
        self.docs.get(document_path).map(|v| v.clone())
    }

    fn sender(&self, group: &str) -> broadcast::Sender<ChangeEvent> {
        self.channels
            .entry(group.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    fn notify(&self, document_path: &str, kind: ChangeKind) {
        // The collection group is the parent collection segment of the path,
        // e.g. "items" for shops/s1/categories/c1/items/i1
        let segments: Vec<&str> = document_path.split('/').collect();
        if segments.len() < 2 {
            return;
        }
        let group = segments[segments.len() - 2].to_string();
        if let Some(sender) = self.channels.get(&group) {
            // No receivers is fine
            let _ = sender.send(ChangeEvent {
                group: group.clone(),
                path: document_path.to_string(),
                kind,
            });
        }
    }
}

#[async_trait]
impl DocStore for MemoryStore {
    async fn stream_all(&self, collection_path: &str) -> StoreResult<Vec<Document>> {
        let prefix = format!("{}/", collection_path);
        let mut docs: Vec<Document> = self
            .docs
            .iter()
            .filter_map(|entry| {
                let rest = entry.key().strip_prefix(&prefix)?;
                // Direct children only - skip subcollection documents
                if rest.contains('/') {
                    return None;
                }
                Some(Document {
                    id: rest.to_string(),
                    data: entry.value().clone(),
                })
            })
            .collect();
        // Deterministic order for stable snapshots
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    fn subscribe(&self, collection_group: &str) -> broadcast::Receiver<ChangeEvent> {
        self.sender(collection_group).subscribe()
    }

    async fn get(&self, document_path: &str) -> StoreResult<Option<Document>> {
        Ok(self.docs.get(document_path).map(|entry| Document {
            id: document_path
                .rsplit('/')
                .next()
                .unwrap_or(document_path)
                .to_string(),
            data: entry.value().clone(),
        }))
    }

    async fn update(&self, document_path: &str, fields: Map<String, Value>) -> StoreResult<()> {
        {
            let mut entry = self
                .docs
                .get_mut(document_path)
                .ok_or_else(|| StoreError::NotFound(document_path.to_string()))?;
            let doc = entry.value_mut();
            if let Some(obj) = doc.as_object_mut() {
                for (key, value) in fields {
                    obj.insert(key, value);
                }
            } else {
                *doc = Value::Object(fields);
            }
        }
        self.notify(document_path, ChangeKind::Updated);
        Ok(())
    }
}
