use std::collections::HashMap;

use serde_json::Value;
use shared::{
    domain::{BlockList, BlockSummary, KeywordList},
    error::BlockerError,
    protocol::{
        AUTO_BLOCKED_TOTAL_KEY, BLOCKED_THREADS_KEY, BLOCK_WORDS_KEY, LAST_AUTO_BLOCKED_TITLE_KEY,
        MANUAL_BLOCKED_TOTAL_KEY,
    },
};
use storage::KeyValueStore;
use tracing::error;

use crate::normalize::{normalize_entries_value, normalize_words_value};

pub const ALL_KEYS: [&str; 5] = [
    BLOCKED_THREADS_KEY,
    BLOCK_WORDS_KEY,
    AUTO_BLOCKED_TOTAL_KEY,
    LAST_AUTO_BLOCKED_TITLE_KEY,
    MANUAL_BLOCKED_TOTAL_KEY,
];

/// Canonical view of every persisted key at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockState {
    pub block_list: BlockList,
    pub keywords: KeywordList,
    pub auto_blocked_total: u64,
    pub manual_blocked_total: u64,
    pub last_auto_blocked_title: Option<String>,
}

impl BlockState {
    pub fn from_values(values: &HashMap<String, Value>) -> Self {
        Self {
            block_list: normalize_entries_value(values.get(BLOCKED_THREADS_KEY)),
            keywords: normalize_words_value(values.get(BLOCK_WORDS_KEY)),
            auto_blocked_total: counter(values, AUTO_BLOCKED_TOTAL_KEY),
            manual_blocked_total: counter(values, MANUAL_BLOCKED_TOTAL_KEY),
            last_auto_blocked_title: values
                .get(LAST_AUTO_BLOCKED_TITLE_KEY)
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    pub fn summary(&self) -> BlockSummary {
        BlockSummary {
            auto_blocked_total: self.auto_blocked_total,
            manual_blocked_total: self.manual_blocked_total,
            last_auto_blocked_title: self.last_auto_blocked_title.clone(),
            blocked_entries: self.block_list.len(),
            keywords: self.keywords.len(),
        }
    }
}

/// Non-negative integer stored under `key`; anything else reads as 0.
pub fn counter(values: &HashMap<String, Value>, key: &str) -> u64 {
    values.get(key).and_then(Value::as_u64).unwrap_or(0)
}

pub async fn read_values<S>(store: &S, keys: &[&str]) -> Result<HashMap<String, Value>, BlockerError>
where
    S: KeyValueStore + ?Sized,
{
    store.get(keys).await.map_err(|err| {
        error!(?keys, error = %err, "failed to read blocker state");
        BlockerError::storage_read(format!("{err:#}"))
    })
}

pub async fn write_values<S>(store: &S, entries: Vec<(String, Value)>) -> Result<(), BlockerError>
where
    S: KeyValueStore + ?Sized,
{
    let keys: Vec<String> = entries.iter().map(|(key, _)| key.clone()).collect();
    store.set(entries).await.map_err(|err| {
        error!(?keys, error = %err, "failed to write blocker state");
        BlockerError::storage_write(format!("{err:#}"))
    })
}

pub async fn read_state<S>(store: &S) -> Result<BlockState, BlockerError>
where
    S: KeyValueStore + ?Sized,
{
    let values = read_values(store, &ALL_KEYS).await?;
    Ok(BlockState::from_values(&values))
}

pub(crate) fn list_value(list: &BlockList) -> Result<Value, BlockerError> {
    Ok(serde_json::to_value(list)?)
}

pub(crate) fn words_value(words: &KeywordList) -> Result<Value, BlockerError> {
    Ok(serde_json::to_value(words)?)
}
