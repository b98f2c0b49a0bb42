use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::KeyValueStore;

/// Process-local store. Clones share the same underlying map, so several
/// writers can be pointed at one store to exercise interleavings.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries.into_iter().collect())),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn value(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    /// Number of `set` calls that reached the store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(*key).map(|v| ((*key).to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, batch: Vec<(String, Value)>) -> Result<()> {
        let mut entries = self.entries.write().await;
        for (key, value) in batch {
            entries.insert(key, value);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
