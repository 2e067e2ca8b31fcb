//! Live paragraph feedback.
//!
//! - **`paragraph`**: finds the paragraph under the cursor
//! - **`suggestion`**: the categorized, individually addressable critique items
//! - **`coordinator`**: debounce, stale-response guard and the apply engine

pub mod coordinator;
pub mod paragraph;
pub mod suggestion;

pub use coordinator::{
    AnalysisTicket, ApplyError, ApplyOutcome, ApplyScope, FeedbackCoordinator, Generation, Phase,
    QUIET_PERIOD, Received, RewriteTicket,
};
pub use paragraph::{MIN_ANALYZABLE_CHARS, Span, locate};
pub use suggestion::{Category, Suggestion, SuggestionDraft, SuggestionId};
