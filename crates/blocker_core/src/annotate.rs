//! Per-item presentation state and the effects derived from a verdict.

use std::collections::{HashMap, HashSet};

use shared::{
    domain::{Item, ItemHandle, ItemId},
    protocol::{HideReason, ItemEffect},
};

use crate::{classify::Verdict, normalize::normalize_title};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationState {
    pub hidden: bool,
    /// Set once the item has contributed a count signal; never reset while the
    /// item stays rendered.
    pub counted: bool,
    pub control_attached: bool,
}

/// Which aggregate a count signal feeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignalKey {
    Identifier(ItemId),
    Keyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountSignal {
    pub key: SignalKey,
    pub handle: ItemHandle,
    /// Present for keyword signals when the item carries an id.
    pub item_id: Option<ItemId>,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub state: AnnotationState,
    pub effects: Vec<ItemEffect>,
    pub signal: Option<CountSignal>,
}

/// Applies `verdict` to `state`. Running it again on the returned state with
/// the same verdict yields no effects and no signal.
pub fn annotate(item: &Item, verdict: &Verdict, state: AnnotationState) -> Annotation {
    let mut next = state;
    let mut effects = Vec::new();
    let mut signal = None;

    let (reason, key) = match verdict {
        Verdict::AlreadyBlocked(entry) => (
            HideReason::Blocked {
                id: entry.id.clone(),
            },
            SignalKey::Identifier(entry.id.clone()),
        ),
        Verdict::KeywordMatch(word) => (
            HideReason::Keyword { word: word.clone() },
            SignalKey::Keyword,
        ),
        Verdict::NotBlocked => {
            if !state.hidden && !state.control_attached {
                effects.push(ItemEffect::AttachBlockControl {
                    handle: item.handle,
                });
                next.control_attached = true;
            }
            return Annotation {
                state: next,
                effects,
                signal,
            };
        }
    };

    if !state.hidden {
        effects.push(ItemEffect::Hide {
            handle: item.handle,
            reason,
        });
        next.hidden = true;
        if !state.counted {
            signal = Some(CountSignal {
                key,
                handle: item.handle,
                item_id: item.id.clone(),
                title: normalize_title(&item.title),
            });
            next.counted = true;
        }
    }

    Annotation {
        state: next,
        effects,
        signal,
    }
}

/// Caller-owned annotation states keyed by render handle.
#[derive(Debug, Default)]
pub struct AnnotationSession {
    states: HashMap<ItemHandle, AnnotationState>,
}

impl AnnotationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, handle: ItemHandle) -> AnnotationState {
        self.states.get(&handle).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn annotate(&mut self, item: &Item, verdict: &Verdict) -> Annotation {
        let annotation = annotate(item, verdict, self.state(item.handle));
        self.states.insert(item.handle, annotation.state);
        annotation
    }

    /// Hides an item on explicit user request. The item is also marked counted:
    /// the manual block already accounts for this encounter.
    pub fn mark_manually_blocked(&mut self, item: &Item) -> Vec<ItemEffect> {
        let state = self.states.entry(item.handle).or_default();
        let was_hidden = state.hidden;
        state.hidden = true;
        state.counted = true;
        if was_hidden {
            Vec::new()
        } else {
            vec![ItemEffect::Hide {
                handle: item.handle,
                reason: HideReason::Manual,
            }]
        }
    }

    /// Drops states of items that are no longer rendered.
    pub fn retain(&mut self, rendered: impl IntoIterator<Item = ItemHandle>) {
        let keep: HashSet<ItemHandle> = rendered.into_iter().collect();
        self.states.retain(|handle, _| keep.contains(handle));
    }
}

#[cfg(test)]
#[path = "tests/annotate_tests.rs"]
mod tests;
