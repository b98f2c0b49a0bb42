use serde::Serialize;
use serde_json::Value;
use shared::{
    domain::{BlockEntry, Item},
    error::BlockerError,
    protocol::{BLOCKED_THREADS_KEY, MANUAL_BLOCKED_TOTAL_KEY},
};
use storage::KeyValueStore;
use tracing::{info, warn};

use crate::{
    normalize::{normalize_entries_value, normalize_title},
    reconcile::NEW_ENTRY_COUNT,
    state::{counter, list_value, read_values, write_values},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ManualBlockOutcome {
    Blocked { entry: BlockEntry },
    AlreadyBlocked,
    /// Hidden for this session only; nothing was persisted.
    MissingIdentifier,
}

/// Persists an explicit block of `item`. Hiding the item is the caller's
/// concern and happens whether or not this succeeds.
pub async fn block_manually<S>(store: &S, item: &Item) -> Result<ManualBlockOutcome, BlockerError>
where
    S: KeyValueStore + ?Sized,
{
    let Some(id) = item.id.clone() else {
        warn!(handle = item.handle.0, "could not derive an id; block will not persist");
        return Ok(ManualBlockOutcome::MissingIdentifier);
    };

    let values = read_values(store, &[BLOCKED_THREADS_KEY, MANUAL_BLOCKED_TOTAL_KEY]).await?;
    let mut list = normalize_entries_value(values.get(BLOCKED_THREADS_KEY));
    if list.contains(&id) {
        info!(%id, "thread already blocked");
        return Ok(ManualBlockOutcome::AlreadyBlocked);
    }

    // an empty title would be replaced by the id on the next load anyway
    let title = Some(normalize_title(&item.title))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| id.0.clone());
    let entry = BlockEntry::new(id, title, NEW_ENTRY_COUNT);
    list.insert(entry.clone());
    let manual_total = counter(&values, MANUAL_BLOCKED_TOTAL_KEY).saturating_add(1);

    write_values(
        store,
        vec![
            (BLOCKED_THREADS_KEY.to_string(), list_value(&list)?),
            (MANUAL_BLOCKED_TOTAL_KEY.to_string(), Value::from(manual_total)),
        ],
    )
    .await?;
    info!(id = %entry.id, "thread blocked");
    Ok(ManualBlockOutcome::Blocked { entry })
}

#[cfg(test)]
#[path = "tests/manual_tests.rs"]
mod tests;
