//! Merging a batch's count signals into the persisted block state.
//!
//! The store offers no atomic increment, so every commit is a whole-value
//! read-modify-write. [`commit`] re-reads the keys it merges into right before
//! computing the merge and writes all changed keys in one `set` call. A writer
//! that lands between that read and the write is overwritten; the window is
//! narrowed, never closed.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use shared::{
    domain::{BlockEntry, BlockList, ItemId},
    error::BlockerError,
    protocol::{AUTO_BLOCKED_TOTAL_KEY, BLOCKED_THREADS_KEY, LAST_AUTO_BLOCKED_TITLE_KEY},
};
use storage::KeyValueStore;
use tracing::{debug, info, warn};

use crate::{
    annotate::{CountSignal, SignalKey},
    normalize::normalize_entries_value,
    state::{counter, list_value, read_values, write_values},
};

/// Count given to entries created by a block, manual or automatic.
pub const NEW_ENTRY_COUNT: u64 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerOptions {
    /// Append keyword-matched items that carry an id to the block list.
    pub persist_keyword_matches: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileDelta {
    /// Count added to each existing entry.
    pub increments: BTreeMap<ItemId, u64>,
    /// Identifier signals whose entry was no longer on the list.
    pub orphaned: Vec<ItemId>,
    pub keyword_hits: u64,
    pub last_keyword_title: Option<String>,
    pub newly_blocked: Vec<BlockEntry>,
}

impl ReconcileDelta {
    pub fn is_empty(&self) -> bool {
        self.increments.is_empty()
            && self.keyword_hits == 0
            && self.newly_blocked.is_empty()
            && self.orphaned.is_empty()
    }

    pub fn total_increments(&self) -> u64 {
        self.increments.values().sum()
    }

    fn changes_list(&self) -> bool {
        !self.increments.is_empty() || !self.newly_blocked.is_empty()
    }
}

pub fn reconcile(signals: &[CountSignal], current: &BlockList) -> (BlockList, ReconcileDelta) {
    reconcile_with(signals, current, ReconcilerOptions::default())
}

/// Pure merge of `signals` into `current`. Identifier signals are grouped per
/// id and added to the matching entry's count; keyword signals feed the
/// automatic-block counters.
pub fn reconcile_with(
    signals: &[CountSignal],
    current: &BlockList,
    options: ReconcilerOptions,
) -> (BlockList, ReconcileDelta) {
    let mut grouped: BTreeMap<ItemId, u64> = BTreeMap::new();
    let mut delta = ReconcileDelta::default();

    for signal in signals {
        match &signal.key {
            SignalKey::Identifier(id) => *grouped.entry(id.clone()).or_default() += 1,
            SignalKey::Keyword => {
                delta.keyword_hits += 1;
                delta.last_keyword_title = Some(signal.title.clone());
            }
        }
    }

    let mut updated = current.clone();
    for (id, increment) in grouped {
        match updated.get_mut(&id) {
            Some(entry) => {
                entry.count = entry.count.saturating_add(increment);
                delta.increments.insert(id, increment);
            }
            None => delta.orphaned.push(id),
        }
    }

    if options.persist_keyword_matches {
        for signal in signals.iter().filter(|s| s.key == SignalKey::Keyword) {
            let Some(id) = &signal.item_id else {
                continue;
            };
            let entry = BlockEntry::new(id.clone(), signal.title.clone(), NEW_ENTRY_COUNT);
            if updated.insert(entry.clone()) {
                delta.newly_blocked.push(entry);
            }
        }
    }

    (updated, delta)
}

/// Re-reads the block list and counters, merges `signals` and writes the
/// changed keys back. An empty merge performs no write.
pub async fn commit<S>(
    store: &S,
    signals: &[CountSignal],
    options: ReconcilerOptions,
) -> Result<ReconcileDelta, BlockerError>
where
    S: KeyValueStore + ?Sized,
{
    if signals.is_empty() {
        return Ok(ReconcileDelta::default());
    }

    let values = read_values(store, &[BLOCKED_THREADS_KEY, AUTO_BLOCKED_TOTAL_KEY]).await?;
    let current = normalize_entries_value(values.get(BLOCKED_THREADS_KEY));
    let auto_total = counter(&values, AUTO_BLOCKED_TOTAL_KEY);

    let (updated, delta) = reconcile_with(signals, &current, options);
    if !delta.orphaned.is_empty() {
        warn!(orphaned = ?delta.orphaned, "count signals for entries no longer blocked");
    }

    let mut entries = Vec::new();
    if delta.changes_list() {
        entries.push((BLOCKED_THREADS_KEY.to_string(), list_value(&updated)?));
    }
    if delta.keyword_hits > 0 {
        entries.push((
            AUTO_BLOCKED_TOTAL_KEY.to_string(),
            Value::from(auto_total.saturating_add(delta.keyword_hits)),
        ));
        if let Some(title) = &delta.last_keyword_title {
            entries.push((
                LAST_AUTO_BLOCKED_TITLE_KEY.to_string(),
                Value::from(title.clone()),
            ));
        }
    }

    if entries.is_empty() {
        debug!("nothing to reconcile");
        return Ok(delta);
    }

    write_values(store, entries).await?;
    info!(
        increments = delta.total_increments(),
        keyword_hits = delta.keyword_hits,
        newly_blocked = delta.newly_blocked.len(),
        "reconciled block counts"
    );
    Ok(delta)
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
