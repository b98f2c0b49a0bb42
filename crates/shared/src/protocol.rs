use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Item, ItemHandle, ItemId},
    error::BlockerError,
};

pub const BLOCKED_THREADS_KEY: &str = "blocked_threads";
pub const BLOCK_WORDS_KEY: &str = "block_words";
pub const AUTO_BLOCKED_TOTAL_KEY: &str = "auto_blocked_total";
pub const LAST_AUTO_BLOCKED_TITLE_KEY: &str = "last_auto_blocked_title";
pub const MANUAL_BLOCKED_TOTAL_KEY: &str = "manual_blocked_total";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HideReason {
    Blocked { id: ItemId },
    Keyword { word: String },
    Manual,
}

/// Visual intent produced for one rendered item. The presentation side applies
/// these; nothing here touches storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ItemEffect {
    Hide {
        handle: ItemHandle,
        reason: HideReason,
    },
    AttachBlockControl {
        handle: ItemHandle,
    },
}

impl ItemEffect {
    pub fn handle(&self) -> ItemHandle {
        match self {
            ItemEffect::Hide { handle, .. } | ItemEffect::AttachBlockControl { handle } => *handle,
        }
    }
}

/// Ids arrive as strings or integers; anything else leaves the row id-less.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawItemId {
    Text(String),
    Number(i64),
    Other(serde_json::Value),
}

/// One row of an item-source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RawItemId>,
    #[serde(default)]
    pub title: String,
}

impl ItemRecord {
    /// Converts the record into an [`Item`]; `fallback` is used when the
    /// source does not assign a handle.
    pub fn into_item(self, fallback: ItemHandle) -> Item {
        let id = match self.id {
            Some(RawItemId::Text(text)) if !text.trim().is_empty() => {
                Some(ItemId(text.trim().to_string()))
            }
            Some(RawItemId::Number(n)) => Some(ItemId(n.to_string())),
            _ => None,
        };
        Item {
            handle: self.handle.map(ItemHandle).unwrap_or(fallback),
            id,
            title: self.title,
        }
    }
}

/// Converts a whole document. Rows without a handle are numbered in document
/// order starting above the largest explicit handle, so they never share a
/// handle with another row.
pub fn items_from_records(records: Vec<ItemRecord>) -> Vec<Item> {
    let mut next = records
        .iter()
        .filter_map(|record| record.handle)
        .max()
        .map_or(0, |max| max.saturating_add(1));
    records
        .into_iter()
        .map(|record| {
            let fallback = ItemHandle(next);
            if record.handle.is_none() {
                next = next.saturating_add(1);
            }
            record.into_item(fallback)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub completed_at: DateTime<Utc>,
    pub items: usize,
    pub hidden: usize,
    pub controls_attached: usize,
    pub count_increments: u64,
    pub keyword_hits: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub newly_blocked: Vec<ItemId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BlockerError>,
}
