//! Detection pipeline for the repost watcher.
//!
//! One cycle is: [`navigator`] brings the profile's repost tab on screen,
//! [`extractor`] reads the newest item, [`detector`] compares it against the
//! persisted [`WatchState`], and [`cycle::Watcher`] persists and notifies.
//! [`scheduler`] repeats cycles with a jittered sleep in between.

pub mod cycle;
pub mod detector;
pub mod diagnostics;
pub mod error;
pub mod extractor;
pub mod navigator;
pub mod normalize;
pub mod scheduler;
pub mod state;
pub mod types;

pub use cycle::{WatchSettings, Watcher};
pub use detector::detect;
pub use error::{CycleError, StateError};
pub use extractor::{Extractor, ITEM_LOCATOR_TIERS};
pub use navigator::{match_block_keywords, page_text, Navigation, Navigator, NavigatorSettings};
pub use normalize::{item_id, normalize_reference, profile_url};
pub use scheduler::{jittered_delay, run_forever};
pub use state::{StateStore, WatchState};
pub use types::{
    CycleOutcome, DiagnosticContext, DiagnosticReason, ExtractedItem, TabAttempt, TabAttemptResult,
    TabHeuristic, TabSelection,
};
