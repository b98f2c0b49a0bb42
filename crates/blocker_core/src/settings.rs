//! Read access and list-editing commands for the settings and popup views.
//! Each command re-reads the key it edits right before writing it.

use shared::{
    domain::{BlockEntry, BlockSummary, ItemId, KeywordList},
    error::BlockerError,
    protocol::{BLOCKED_THREADS_KEY, BLOCK_WORDS_KEY},
};
use storage::KeyValueStore;
use tracing::info;

use crate::{
    normalize::{normalize_entries_value, normalize_words_value},
    state::{list_value, read_state, read_values, words_value, write_values},
};

pub async fn list_block_entries<S>(store: &S) -> Result<Vec<BlockEntry>, BlockerError>
where
    S: KeyValueStore + ?Sized,
{
    let values = read_values(store, &[BLOCKED_THREADS_KEY]).await?;
    Ok(normalize_entries_value(values.get(BLOCKED_THREADS_KEY)).into_vec())
}

pub async fn list_keywords<S>(store: &S) -> Result<Vec<String>, BlockerError>
where
    S: KeyValueStore + ?Sized,
{
    let values = read_values(store, &[BLOCK_WORDS_KEY]).await?;
    Ok(normalize_words_value(values.get(BLOCK_WORDS_KEY))
        .iter()
        .cloned()
        .collect())
}

pub async fn summary<S>(store: &S) -> Result<BlockSummary, BlockerError>
where
    S: KeyValueStore + ?Sized,
{
    Ok(read_state(store).await?.summary())
}

/// Unblocks `id`. Returns the removed entry, or `None` without writing when the
/// id was not blocked.
pub async fn remove_block_entry<S>(store: &S, id: &ItemId) -> Result<Option<BlockEntry>, BlockerError>
where
    S: KeyValueStore + ?Sized,
{
    let values = read_values(store, &[BLOCKED_THREADS_KEY]).await?;
    let mut list = normalize_entries_value(values.get(BLOCKED_THREADS_KEY));
    let Some(removed) = list.remove(id) else {
        return Ok(None);
    };
    write_values(
        store,
        vec![(BLOCKED_THREADS_KEY.to_string(), list_value(&list)?)],
    )
    .await?;
    info!(%id, "thread unblocked");
    Ok(Some(removed))
}

pub async fn remove_keyword<S>(store: &S, word: &str) -> Result<bool, BlockerError>
where
    S: KeyValueStore + ?Sized,
{
    let values = read_values(store, &[BLOCK_WORDS_KEY]).await?;
    let mut words = normalize_words_value(values.get(BLOCK_WORDS_KEY));
    if !words.remove(word) {
        return Ok(false);
    }
    write_values(
        store,
        vec![(BLOCK_WORDS_KEY.to_string(), words_value(&words)?)],
    )
    .await?;
    info!(word = %KeywordList::canonical(word), "keyword removed");
    Ok(true)
}

/// Adds raw keywords after canonicalizing them. Returns the words that were
/// not already present.
pub async fn add_keywords<S>(store: &S, raw: &[String]) -> Result<Vec<String>, BlockerError>
where
    S: KeyValueStore + ?Sized,
{
    let values = read_values(store, &[BLOCK_WORDS_KEY]).await?;
    let mut words = normalize_words_value(values.get(BLOCK_WORDS_KEY));
    let added: Vec<String> = raw
        .iter()
        .filter(|word| words.insert(word))
        .map(|word| KeywordList::canonical(word))
        .collect();
    if added.is_empty() {
        return Ok(added);
    }
    write_values(
        store,
        vec![(BLOCK_WORDS_KEY.to_string(), words_value(&words)?)],
    )
    .await?;
    info!(added = ?added, "keywords added");
    Ok(added)
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
