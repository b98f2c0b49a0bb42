//! Block-state reconciliation: deciding which rendered threads to hide and
//! folding what was hidden back into the persisted block lists and counters.

pub mod annotate;
pub mod classify;
pub mod engine;
pub mod manual;
pub mod normalize;
pub mod reconcile;
pub mod settings;
pub mod state;

pub use annotate::{annotate, AnnotationSession, AnnotationState, CountSignal, SignalKey};
pub use classify::{classify, Verdict};
pub use engine::{BlockerEngine, ItemSource, ManualBlockReport, PassReport};
pub use manual::{block_manually, ManualBlockOutcome};
pub use normalize::{normalize_entries, normalize_title, normalize_words};
pub use reconcile::{reconcile, reconcile_with, ReconcileDelta, ReconcilerOptions};
pub use state::{read_state, BlockState};
