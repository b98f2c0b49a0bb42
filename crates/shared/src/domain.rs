use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a rendered item (a forum thread id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Render identity of one row. Two rows showing the same thread share an
/// [`ItemId`] but never a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub handle: ItemHandle,
    pub id: Option<ItemId>,
    pub title: String,
}

impl Item {
    pub fn new(handle: u64, id: Option<&str>, title: impl Into<String>) -> Self {
        Self {
            handle: ItemHandle(handle),
            id: id.map(ItemId::from),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub id: ItemId,
    pub title: String,
    pub count: u64,
}

impl BlockEntry {
    pub fn new(id: ItemId, title: impl Into<String>, count: u64) -> Self {
        Self {
            id,
            title: title.into(),
            count,
        }
    }
}

/// Insertion-ordered list of [`BlockEntry`] holding at most one entry per id.
/// Only serialized; loads go through the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BlockList {
    entries: Vec<BlockEntry>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BlockEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: &ItemId) -> Option<&BlockEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn get_mut(&mut self, id: &ItemId) -> Option<&mut BlockEntry> {
        self.entries.iter_mut().find(|entry| &entry.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Appends `entry` unless its id is already present. Returns whether the
    /// entry was inserted.
    pub fn insert(&mut self, entry: BlockEntry) -> bool {
        if self.contains(&entry.id) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<BlockEntry> {
        let index = self.entries.iter().position(|entry| &entry.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn into_vec(self) -> Vec<BlockEntry> {
        self.entries
    }
}

impl FromIterator<BlockEntry> for BlockList {
    fn from_iter<T: IntoIterator<Item = BlockEntry>>(iter: T) -> Self {
        let mut list = BlockList::new();
        for entry in iter {
            list.insert(entry);
        }
        list
    }
}

impl<'a> IntoIterator for &'a BlockList {
    type Item = &'a BlockEntry;
    type IntoIter = std::slice::Iter<'a, BlockEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Ordered set of lower-cased, non-empty keywords with whitespace runs
/// collapsed to single spaces.
///
/// Order is kept so keyword matching can report the first match
/// deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeywordList {
    words: Vec<String>,
}

impl KeywordList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.words.iter()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Stored form of a keyword. Titles get the same whitespace rule before
    /// matching, so a stored word can always be found in a title.
    pub fn canonical(raw: &str) -> String {
        raw.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Inserts the canonical form of `raw`. Empty and duplicate words are
    /// ignored. Returns whether the list changed.
    pub fn insert(&mut self, raw: &str) -> bool {
        let word = Self::canonical(raw);
        if word.is_empty() || self.contains(&word) {
            return false;
        }
        self.words.push(word);
        true
    }

    pub fn remove(&mut self, raw: &str) -> bool {
        let word = Self::canonical(raw);
        let before = self.words.len();
        self.words.retain(|w| *w != word);
        self.words.len() != before
    }
}

impl<'a> FromIterator<&'a str> for KeywordList {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut list = KeywordList::new();
        for word in iter {
            list.insert(word);
        }
        list
    }
}

/// Popup data: aggregate counters plus list sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub auto_blocked_total: u64,
    pub manual_blocked_total: u64,
    pub last_auto_blocked_title: Option<String>,
    pub blocked_entries: usize,
    pub keywords: usize,
}
