use shared::domain::{BlockEntry, BlockList, Item, KeywordList};

use crate::normalize::collapse_whitespace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The item's id is on the identifier block-list.
    AlreadyBlocked(BlockEntry),
    /// The title contains this keyword (first match in list order).
    KeywordMatch(String),
    NotBlocked,
}

impl Verdict {
    pub fn hides(&self) -> bool {
        !matches!(self, Verdict::NotBlocked)
    }
}

/// Decides how one item is treated. An identifier match always wins over a
/// keyword match.
pub fn classify(item: &Item, block_list: &BlockList, keywords: &KeywordList) -> Verdict {
    if let Some(entry) = item.id.as_ref().and_then(|id| block_list.get(id)) {
        return Verdict::AlreadyBlocked(entry.clone());
    }
    match matching_keyword(&item.title, keywords) {
        Some(word) => Verdict::KeywordMatch(word.to_string()),
        None => Verdict::NotBlocked,
    }
}

/// First keyword contained anywhere in `title`, ignoring case. Matches are not
/// word-bounded.
pub fn matching_keyword<'a>(title: &str, keywords: &'a KeywordList) -> Option<&'a str> {
    if keywords.is_empty() {
        return None;
    }
    let haystack = collapse_whitespace(title).to_lowercase();
    keywords
        .iter()
        .map(String::as_str)
        .find(|word| haystack.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::ItemId;

    fn list(entries: &[(&str, u64)]) -> BlockList {
        entries
            .iter()
            .map(|(id, count)| BlockEntry::new(ItemId::from(*id), format!("thread {id}"), *count))
            .collect()
    }

    #[test]
    fn keyword_match_ignores_case() {
        let keywords: KeywordList = ["spam"].into_iter().collect();
        let item = Item::new(1, Some("9"), "Free SPAM offer");
        assert_eq!(
            classify(&item, &BlockList::new(), &keywords),
            Verdict::KeywordMatch("spam".into())
        );
    }

    #[test]
    fn keyword_matches_inside_other_words() {
        let keywords: KeywordList = ["cat"].into_iter().collect();
        let item = Item::new(1, None, "Concatenation tricks");
        assert!(classify(&item, &BlockList::new(), &keywords).hides());
    }

    #[test]
    fn multi_word_keyword_matches_across_collapsed_whitespace() {
        let keywords: KeywordList = ["buy now"].into_iter().collect();
        let item = Item::new(1, None, "Buy\n\t   NOW while stocks last");
        assert_eq!(
            classify(&item, &BlockList::new(), &keywords),
            Verdict::KeywordMatch("buy now".into())
        );
    }

    #[test]
    fn stored_keyword_with_whitespace_run_still_matches() {
        let keywords = crate::normalize::normalize_words(&[serde_json::json!("buy  now")]);
        let item = Item::new(1, None, "Buy now");
        assert_eq!(
            classify(&item, &BlockList::new(), &keywords),
            Verdict::KeywordMatch("buy now".into())
        );
    }

    #[test]
    fn first_keyword_in_list_order_is_reported() {
        let keywords: KeywordList = ["offer", "spam"].into_iter().collect();
        let item = Item::new(1, None, "spam offer");
        assert_eq!(
            classify(&item, &BlockList::new(), &keywords),
            Verdict::KeywordMatch("offer".into())
        );
    }

    #[test]
    fn identifier_match_takes_precedence_over_keywords() {
        let keywords: KeywordList = ["spam"].into_iter().collect();
        let blocked = list(&[("42", 3)]);
        let item = Item::new(1, Some("42"), "spam spam spam");
        match classify(&item, &blocked, &keywords) {
            Verdict::AlreadyBlocked(entry) => assert_eq!(entry.count, 3),
            other => panic!("unexpected verdict {other:?}"),
        }
    }

    #[test]
    fn unrelated_items_are_not_blocked() {
        let keywords: KeywordList = ["spam"].into_iter().collect();
        let blocked = list(&[("42", 0)]);
        let with_id = Item::new(1, Some("43"), "Weekly meetup");
        let without_id = Item::new(2, None, "Weekly meetup");
        assert_eq!(classify(&with_id, &blocked, &keywords), Verdict::NotBlocked);
        assert_eq!(
            classify(&without_id, &blocked, &keywords),
            Verdict::NotBlocked
        );
    }

    #[test]
    fn keyword_verdict_matches_substring_test_for_sample_inputs() {
        let keywords: KeywordList = ["éclair", "rust", "a b"].into_iter().collect();
        let titles = [
            "",
            "RUSTY",
            "Éclair recipe",
            "trust me",
            "a  b",
            "ab",
            "nothing here",
        ];
        for title in titles {
            let lowered = collapse_whitespace(title).to_lowercase();
            let expected = keywords.iter().any(|w| lowered.contains(w.as_str()));
            let item = Item::new(0, None, title);
            assert_eq!(
                classify(&item, &BlockList::new(), &keywords).hides(),
                expected,
                "title {title:?}"
            );
        }
    }
}
