use chrono::Utc;
use shared::{
    domain::{BlockList, Item, ItemHandle, KeywordList},
    error::BlockerError,
    protocol::{ItemEffect, ScanSummary},
};
use storage::KeyValueStore;
use tracing::{debug, warn};

use crate::{
    annotate::{AnnotationSession, CountSignal},
    classify::{classify, Verdict},
    manual::{block_manually, ManualBlockOutcome},
    reconcile::{commit, ReconcileDelta, ReconcilerOptions},
    state::read_state,
};

/// Supplies the currently rendered items. Re-queried on every pass.
pub trait ItemSource {
    fn query_items(&self) -> Vec<Item>;
}

impl ItemSource for Vec<Item> {
    fn query_items(&self) -> Vec<Item> {
        self.clone()
    }
}

impl ItemSource for [Item] {
    fn query_items(&self) -> Vec<Item> {
        self.to_vec()
    }
}

#[derive(Debug)]
pub struct PassReport {
    pub items: usize,
    pub verdicts: Vec<(ItemHandle, Verdict)>,
    /// Visual effects to apply; valid even when persistence failed.
    pub effects: Vec<ItemEffect>,
    pub signals: Vec<CountSignal>,
    /// Set when the lists could not be loaded and the pass ran against empty
    /// lists.
    pub load_error: Option<BlockerError>,
    pub commit: Result<ReconcileDelta, BlockerError>,
}

impl PassReport {
    pub fn hidden(&self) -> usize {
        self.effects
            .iter()
            .filter(|e| matches!(e, ItemEffect::Hide { .. }))
            .count()
    }

    pub fn controls_attached(&self) -> usize {
        self.effects
            .iter()
            .filter(|e| matches!(e, ItemEffect::AttachBlockControl { .. }))
            .count()
    }

    pub fn summary(&self) -> ScanSummary {
        let mut errors: Vec<BlockerError> = self.load_error.iter().cloned().collect();
        let (count_increments, keyword_hits, newly_blocked) = match &self.commit {
            Ok(delta) => (
                delta.total_increments(),
                delta.keyword_hits,
                delta.newly_blocked.iter().map(|e| e.id.clone()).collect(),
            ),
            Err(err) => {
                errors.push(err.clone());
                (0, 0, Vec::new())
            }
        };
        ScanSummary {
            completed_at: Utc::now(),
            items: self.items,
            hidden: self.hidden(),
            controls_attached: self.controls_attached(),
            count_increments,
            keyword_hits,
            newly_blocked,
            errors,
        }
    }
}

#[derive(Debug)]
pub struct ManualBlockReport {
    /// Applied regardless of `result`.
    pub effects: Vec<ItemEffect>,
    pub result: Result<ManualBlockOutcome, BlockerError>,
}

#[derive(Clone)]
pub struct BlockerEngine<S> {
    pub store: S,
    pub options: ReconcilerOptions,
}

impl<S: KeyValueStore> BlockerEngine<S> {
    pub fn new(store: S, options: ReconcilerOptions) -> Self {
        Self { store, options }
    }

    /// Queries `source`, forgets rows that are gone and runs one pass.
    pub async fn scan<I>(&self, source: &I, session: &mut AnnotationSession) -> PassReport
    where
        I: ItemSource + ?Sized,
    {
        let items = source.query_items();
        session.retain(items.iter().map(|item| item.handle));
        self.run_pass(&items, session).await
    }

    /// Classifies and annotates `items`, then commits the batch's count
    /// signals. Storage failures are reported, never raised: a failed load
    /// leaves every item visible.
    pub async fn run_pass(&self, items: &[Item], session: &mut AnnotationSession) -> PassReport {
        let (block_list, keywords, load_error) = match read_state(&self.store).await {
            Ok(state) => (state.block_list, state.keywords, None),
            Err(err) => {
                warn!(error = %err, "block lists unavailable; treating every item as not blocked");
                (BlockList::new(), KeywordList::new(), Some(err))
            }
        };

        let mut verdicts = Vec::with_capacity(items.len());
        let mut effects = Vec::new();
        let mut signals = Vec::new();
        for item in items {
            let verdict = classify(item, &block_list, &keywords);
            let annotation = session.annotate(item, &verdict);
            debug!(
                handle = item.handle.0,
                id = ?item.id,
                ?verdict,
                effects = annotation.effects.len(),
                "annotated item"
            );
            effects.extend(annotation.effects);
            signals.extend(annotation.signal);
            verdicts.push((item.handle, verdict));
        }

        let commit = commit(&self.store, &signals, self.options).await;

        PassReport {
            items: items.len(),
            verdicts,
            effects,
            signals,
            load_error,
            commit,
        }
    }

    /// Hides `item` in `session` and persists the block when it has an id.
    pub async fn block_item(&self, item: &Item, session: &mut AnnotationSession) -> ManualBlockReport {
        let effects = session.mark_manually_blocked(item);
        let result = block_manually(&self.store, item).await;
        ManualBlockReport { effects, result }
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
