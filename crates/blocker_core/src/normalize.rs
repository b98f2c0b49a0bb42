//! Canonicalization of raw persisted values and user input.

use serde::Deserialize;
use serde_json::Value;
use shared::domain::{BlockEntry, BlockList, ItemId, KeywordList};
use tracing::debug;

/// Label of the block control; it leaks into titles captured from rows where
/// the control sits inside the title element.
pub const BLOCK_CONTROL_LABEL: &str = "Block";

/// Shapes a persisted block entry has been stored in.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Legacy(String),
    Record {
        #[serde(default)]
        id: Option<RawId>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        count: Option<Value>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
    Other(Value),
}

impl RawId {
    fn into_item_id(self) -> Option<ItemId> {
        match self {
            RawId::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| ItemId(trimmed.to_string()))
            }
            RawId::Number(n) => Some(ItemId(n.to_string())),
            RawId::Other(_) => None,
        }
    }
}

impl RawEntry {
    fn into_entry(self) -> Option<BlockEntry> {
        match self {
            RawEntry::Legacy(raw) => {
                let id = RawId::Text(raw).into_item_id()?;
                let title = id.0.clone();
                Some(BlockEntry::new(id, title, 0))
            }
            RawEntry::Record { id, title, count } => {
                let id = id?.into_item_id()?;
                let title = title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| id.0.clone());
                let count = count.as_ref().and_then(Value::as_u64).unwrap_or(0);
                Some(BlockEntry::new(id, title, count))
            }
        }
    }
}

/// Canonical keyword list from raw input: non-strings dropped, whitespace
/// collapsed, words lower-cased, empties and duplicates discarded.
pub fn normalize_words(raw: &[Value]) -> KeywordList {
    raw.iter().filter_map(Value::as_str).collect()
}

pub fn normalize_words_value(raw: Option<&Value>) -> KeywordList {
    match raw {
        Some(Value::Array(items)) => normalize_words(items),
        _ => KeywordList::new(),
    }
}

/// Canonical block list from raw persisted entries. Legacy bare strings become
/// `{id: s, title: s, count: 0}`; entries without a usable id are dropped and
/// the first occurrence of a duplicated id wins.
pub fn normalize_entries(raw: &[Value]) -> BlockList {
    let mut list = BlockList::new();
    for value in raw {
        let Ok(parsed) = RawEntry::deserialize(value) else {
            debug!(%value, "dropping undecodable block entry");
            continue;
        };
        let Some(entry) = parsed.into_entry() else {
            debug!(%value, "dropping block entry without usable id");
            continue;
        };
        if !list.insert(entry) {
            debug!(%value, "dropping duplicate block entry");
        }
    }
    list
}

pub fn normalize_entries_value(raw: Option<&Value>) -> BlockList {
    match raw {
        Some(Value::Array(items)) => normalize_entries(items),
        _ => BlockList::new(),
    }
}

/// Collapses whitespace runs to single spaces and strips a trailing block
/// control label.
pub fn normalize_title(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    match collapsed.strip_suffix(BLOCK_CONTROL_LABEL) {
        Some(rest) => rest.trim_end().to_string(),
        None => collapsed,
    }
}

pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
