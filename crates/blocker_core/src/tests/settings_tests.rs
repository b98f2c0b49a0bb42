use super::*;
use serde_json::json;
use shared::protocol::{AUTO_BLOCKED_TOTAL_KEY, LAST_AUTO_BLOCKED_TITLE_KEY};
use storage::MemoryStore;

fn seeded_store() -> MemoryStore {
    MemoryStore::with_entries([
        (
            BLOCKED_THREADS_KEY.to_string(),
            json!([
                {"id": "42", "title": "Old thread", "count": 3},
                "legacy-7",
                {"id": "9", "title": "Another", "count": 1}
            ]),
        ),
        (BLOCK_WORDS_KEY.to_string(), json!(["spam", " Promo ", 5])),
        (AUTO_BLOCKED_TOTAL_KEY.to_string(), json!(12)),
        (
            LAST_AUTO_BLOCKED_TITLE_KEY.to_string(),
            json!("Free SPAM offer"),
        ),
    ])
}

#[tokio::test]
async fn lists_canonical_entries_and_words() {
    let store = seeded_store();
    let entries = list_block_entries(&store).await.expect("entries");
    let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["42", "legacy-7", "9"]);
    assert_eq!(entries[1].title, "legacy-7");

    let words = list_keywords(&store).await.expect("words");
    assert_eq!(words, vec!["spam".to_string(), "promo".to_string()]);
}

#[tokio::test]
async fn summary_reports_popup_data() {
    let store = seeded_store();
    let summary = summary(&store).await.expect("summary");
    assert_eq!(summary.auto_blocked_total, 12);
    assert_eq!(summary.manual_blocked_total, 0);
    assert_eq!(
        summary.last_auto_blocked_title.as_deref(),
        Some("Free SPAM offer")
    );
    assert_eq!(summary.blocked_entries, 3);
    assert_eq!(summary.keywords, 2);
}

#[tokio::test]
async fn removing_entry_keeps_remaining_order() {
    let store = seeded_store();
    let removed = remove_block_entry(&store, &ItemId::from("legacy-7"))
        .await
        .expect("remove");
    assert_eq!(removed.map(|e| e.count), Some(0));

    let entries = list_block_entries(&store).await.expect("entries");
    let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["42", "9"]);
}

#[tokio::test]
async fn removing_unknown_entry_does_not_write() {
    let store = seeded_store();
    let removed = remove_block_entry(&store, &ItemId::from("nope"))
        .await
        .expect("remove");
    assert!(removed.is_none());
    assert!(!remove_keyword(&store, "nope").await.expect("remove word"));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn keywords_are_added_and_removed_in_canonical_form() {
    let store = seeded_store();
    let added = add_keywords(
        &store,
        &["SPAM".to_string(), "  Crypto ".to_string(), "".to_string()],
    )
    .await
    .expect("add");
    assert_eq!(added, vec!["crypto".to_string()]);

    assert!(remove_keyword(&store, "PROMO").await.expect("remove"));
    assert_eq!(store.value(BLOCK_WORDS_KEY).await, Some(json!(["spam", "crypto"])));
}

#[tokio::test]
async fn adding_only_known_words_does_not_write() {
    let store = seeded_store();
    let added = add_keywords(&store, &["spam".to_string()])
        .await
        .expect("add");
    assert!(added.is_empty());
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn added_keyword_is_stored_with_single_spaces() {
    let store = MemoryStore::new();
    let added = add_keywords(&store, &["Buy   now".to_string()])
        .await
        .expect("add");
    assert_eq!(added, vec!["buy now".to_string()]);
    assert_eq!(store.value(BLOCK_WORDS_KEY).await, Some(json!(["buy now"])));
    assert!(remove_keyword(&store, "buy\tnow").await.expect("remove"));
}
