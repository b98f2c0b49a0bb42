use super::*;
use serde_json::json;
use shared::domain::ItemId;
use storage::MemoryStore;

fn stored_entry(outcome: ManualBlockOutcome) -> BlockEntry {
    match outcome {
        ManualBlockOutcome::Blocked { entry } => entry,
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn title_is_normalized_before_storing() {
    let store = MemoryStore::new();
    let item = Item::new(1, Some("42"), "  Old\n thread  Block");
    let entry = stored_entry(block_manually(&store, &item).await.expect("block"));
    assert_eq!(entry, BlockEntry::new(ItemId::from("42"), "Old thread", 1));
    assert_eq!(store.value(MANUAL_BLOCKED_TOTAL_KEY).await, Some(json!(1)));
}

#[tokio::test]
async fn empty_title_falls_back_to_id_and_round_trips() {
    let store = MemoryStore::new();
    for (handle, id, title) in [(1, "5", ""), (2, "6", "Block")] {
        let item = Item::new(handle, Some(id), title);
        let entry = stored_entry(block_manually(&store, &item).await.expect("block"));
        assert_eq!(entry.title, id);
    }

    let persisted = store.value(BLOCKED_THREADS_KEY).await;
    assert_eq!(
        persisted,
        Some(json!([
            {"id": "5", "title": "5", "count": 1},
            {"id": "6", "title": "6", "count": 1}
        ]))
    );
    let reloaded = normalize_entries_value(persisted.as_ref());
    assert_eq!(
        serde_json::to_value(&reloaded).expect("serialize"),
        persisted.expect("persisted")
    );
}

#[tokio::test]
async fn existing_id_is_not_appended_again() {
    let store = MemoryStore::with_entries([(
        BLOCKED_THREADS_KEY.to_string(),
        json!([{"id": "42", "title": "Old thread", "count": 3}]),
    )]);
    let item = Item::new(1, Some("42"), "Old thread");
    assert_eq!(
        block_manually(&store, &item).await.expect("block"),
        ManualBlockOutcome::AlreadyBlocked
    );
    assert_eq!(store.write_count(), 0);
}
