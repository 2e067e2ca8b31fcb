use std::ops::Range;
use std::time::{Duration, Instant};

use crate::editing::{AnchorId, Cmd, Document, Patch};
use crate::feedback::paragraph::{Span, locate};
use crate::feedback::suggestion::{Suggestion, SuggestionDraft, SuggestionId, stamp_batch};

/// Quiet period after the last edit before the paragraph is analyzed
pub const QUIET_PERIOD: Duration = Duration::from_millis(1500);

/// Identifies one debounce cycle; a response is only current if its generation is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing scheduled, nothing in flight
    Idle,
    /// An edit happened; analysis fires at `deadline` unless another edit comes first
    Waiting { deadline: Instant },
    /// An analysis request for `generation` has been handed out
    InFlight { generation: Generation },
}

/// The paragraph the current suggestions (or the in-flight request) refer to
#[derive(Debug, Clone)]
struct PendingFeedback {
    generation: Generation,
    span: Span,
    anchor: AnchorId,
}

/// Everything needed to issue one analysis call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTicket {
    pub generation: Generation,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyScope {
    One(SuggestionId),
    All,
}

/// Everything needed to issue one rewrite call, plus what is needed to splice it back
#[derive(Debug, Clone)]
pub struct RewriteTicket {
    pub generation: Generation,
    pub scope: ApplyScope,
    /// Paragraph text the rewrite is computed against
    pub original: String,
    /// Suggestion descriptions the rewrite must incorporate
    pub instructions: Vec<String>,
    anchor: AnchorId,
    range: Range<usize>,
    document_version: u64,
}

/// How an analysis response was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    Accepted(usize),
    /// The response belongs to a superseded cycle and was dropped
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub scope: ApplyScope,
    /// Where the rewritten paragraph now sits
    pub range: Range<usize>,
    pub patch: Patch,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error("the paragraph changed while the rewrite was being prepared")]
    Conflict,
    #[error("the rewrite came back empty")]
    EmptyReplacement,
}

/// Paragraph-scoped debounced feedback over a document
///
/// A single-threaded state machine: the caller feeds it edits, clock readings
/// and responses, and it hands back tickets describing the external calls to
/// make. Time is passed in rather than read, so the debounce is deterministic.
///
/// ```rust
/// # use std::time::{Duration, Instant};
/// # use rhythm_engine::editing::{Cmd, Document};
/// # use rhythm_engine::feedback::{FeedbackCoordinator, QUIET_PERIOD};
/// let mut feedback = FeedbackCoordinator::new(Document::from_text(""), true);
/// let t0 = Instant::now();
///
/// feedback.edit(Cmd::InsertText { at: 0, text: "A paragraph long enough to analyze.".into() }, t0);
/// assert!(feedback.poll(t0 + Duration::from_millis(100)).is_none());
///
/// let ticket = feedback.poll(t0 + QUIET_PERIOD).unwrap();
/// assert_eq!(ticket.span.text, "A paragraph long enough to analyze.");
/// ```
#[derive(Debug)]
pub struct FeedbackCoordinator {
    document: Document,
    quiet_period: Duration,
    online: bool,
    phase: Phase,
    pending: Option<PendingFeedback>,
    batch: Vec<Suggestion>,
    last_generation: u64,
}

impl FeedbackCoordinator {
    /// `online` is false when no credential is configured; such a coordinator
    /// still edits but never issues a ticket.
    pub fn new(document: Document, online: bool) -> Self {
        Self {
            document,
            quiet_period: QUIET_PERIOD,
            online,
            phase: Phase::Idle,
            pending: None,
            batch: Vec::new(),
            last_generation: 0,
        }
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self.phase, Phase::InFlight { .. })
    }

    /// Currently offered suggestions, in the order the model gave them
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.batch
    }

    /// The paragraph the current suggestions refer to, as captured
    pub fn pending_span(&self) -> Option<&Span> {
        self.pending.as_ref().map(|pending| &pending.span)
    }

    /// When the debounce timer will fire, if one is running
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Waiting { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Apply a user edit and restart the debounce timer
    ///
    /// Displayed feedback is cleared synchronously; the next analysis waits
    /// for the quiet period.
    pub fn edit(&mut self, cmd: Cmd, now: Instant) -> Patch {
        let patch = self.document.apply(cmd);
        self.clear_feedback();
        self.phase = Phase::Waiting {
            deadline: now + self.quiet_period,
        };
        patch
    }

    /// Move the cursor without touching the buffer; does not restart the timer
    pub fn set_cursor(&mut self, cursor: usize) {
        self.document.set_cursor(cursor);
    }

    /// Replace the whole document (e.g. a ghostwriter rewrite)
    ///
    /// Counts as a buffer change for feedback purposes but schedules nothing.
    pub fn replace_document(&mut self, text: &str) -> Patch {
        let cmd = Cmd::replace_all(&self.document, text);
        let patch = self.document.apply(cmd);
        self.clear_feedback();
        self.phase = Phase::Idle;
        patch
    }

    /// Fire the debounce timer if it is due
    ///
    /// The paragraph is located against the buffer and cursor as they are now,
    /// not as they were at the last edit.
    pub fn poll(&mut self, now: Instant) -> Option<AnalysisTicket> {
        let Phase::Waiting { deadline } = self.phase else {
            return None;
        };
        if now < deadline {
            return None;
        }
        self.phase = Phase::Idle;

        if !self.online {
            log::debug!("Debounce fired without a credential; skipping analysis");
            return None;
        }

        let text = self.document.text();
        let Some(span) = locate(&text, self.document.cursor()) else {
            log::debug!("No analyzable paragraph at cursor {}", self.document.cursor());
            return None;
        };

        self.last_generation += 1;
        let generation = Generation(self.last_generation);
        let anchor = self.document.track(span.range());
        log::debug!(
            "Issuing analysis {:?} for paragraph {}..{}",
            generation,
            span.start,
            span.end
        );

        self.pending = Some(PendingFeedback {
            generation,
            span: span.clone(),
            anchor,
        });
        self.phase = Phase::InFlight { generation };

        Some(AnalysisTicket { generation, span })
    }

    /// Accept the suggestions for `generation`, unless that cycle was superseded
    ///
    /// Failed calls should be reported as an empty draft list.
    pub fn receive_analysis(
        &mut self,
        generation: Generation,
        drafts: Vec<SuggestionDraft>,
    ) -> Received {
        let current = matches!(self.phase, Phase::InFlight { generation: g } if g == generation)
            && self
                .pending
                .as_ref()
                .is_some_and(|pending| pending.generation == generation);
        if !current {
            log::debug!("Dropping stale analysis response {generation:?}");
            return Received::Stale;
        }

        self.phase = Phase::Idle;
        let batch = stamp_batch(drafts);
        if batch.is_empty() {
            self.clear_feedback();
            return Received::Accepted(0);
        }

        let count = batch.len();
        self.batch = batch;
        Received::Accepted(count)
    }

    /// Withdraw one suggestion without applying it
    pub fn dismiss(&mut self, id: SuggestionId) -> bool {
        let before = self.batch.len();
        self.batch.retain(|suggestion| suggestion.id != id);
        let removed = self.batch.len() != before;
        if removed && self.batch.is_empty() {
            self.clear_feedback();
        }
        removed
    }

    /// Prepare a rewrite of the pending paragraph
    ///
    /// Returns `None` (a no-op) when offline, when no suggestions are on offer,
    /// or when the requested suggestion is not in the active batch.
    pub fn begin_apply(&mut self, scope: ApplyScope) -> Option<RewriteTicket> {
        if !self.online {
            return None;
        }
        let pending = self.pending.as_ref()?;

        let instructions: Vec<String> = match scope {
            ApplyScope::One(id) => {
                let suggestion = self.batch.iter().find(|s| s.id == id)?;
                vec![suggestion.description.clone()]
            }
            ApplyScope::All => self.batch.iter().map(|s| s.description.clone()).collect(),
        };
        if instructions.is_empty() {
            return None;
        }

        let generation = pending.generation;
        let original = pending.span.text.clone();
        let range = self.document.anchor_range(pending.anchor)?;
        let anchor = self.document.track(range.clone());

        Some(RewriteTicket {
            generation,
            scope,
            original,
            instructions,
            anchor,
            range,
            document_version: self.document.version(),
        })
    }

    /// Splice a rewrite back into the document
    ///
    /// If the buffer changed since the ticket was issued, the paragraph is
    /// found through its anchor and must still read exactly as it did;
    /// otherwise nothing is spliced and [`ApplyError::Conflict`] is returned.
    pub fn finish_apply(
        &mut self,
        ticket: RewriteTicket,
        replacement: &str,
    ) -> Result<ApplyOutcome, ApplyError> {
        let tracked = self.document.anchor_range(ticket.anchor);
        self.document.release(ticket.anchor);

        let rewritten = replacement.trim();
        if rewritten.is_empty() {
            return Err(ApplyError::EmptyReplacement);
        }

        let range = if self.document.version() == ticket.document_version {
            ticket.range.clone()
        } else {
            let range = tracked.ok_or(ApplyError::Conflict)?;
            if self.document.slice(range.clone()) != ticket.original.as_str() {
                log::info!(
                    "Paragraph changed under rewrite {:?}; not applying",
                    ticket.generation
                );
                return Err(ApplyError::Conflict);
            }
            range
        };

        let text = rewrap(&ticket.original, rewritten);
        let new_range = range.start..range.start + text.len();
        let patch = self.document.apply(Cmd::ReplaceRange {
            range,
            text: text.clone(),
        });

        self.settle_after_apply(&ticket, new_range.clone(), text);

        Ok(ApplyOutcome {
            scope: ticket.scope,
            range: new_range,
            patch,
        })
    }

    /// Forget a rewrite whose call failed
    pub fn abandon_apply(&mut self, ticket: RewriteTicket) {
        self.document.release(ticket.anchor);
    }

    fn settle_after_apply(&mut self, ticket: &RewriteTicket, new_range: Range<usize>, text: String) {
        let still_current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == ticket.generation);
        if !still_current {
            return;
        }

        match ticket.scope {
            ApplyScope::All => self.clear_feedback(),
            ApplyScope::One(id) => {
                self.batch.retain(|suggestion| suggestion.id != id);
                if self.batch.is_empty() {
                    self.clear_feedback();
                    return;
                }
                // Siblings now refer to the rewritten paragraph
                if let Some(pending) = self.pending.as_mut() {
                    self.document.release(pending.anchor);
                    pending.anchor = self.document.track(new_range.clone());
                    pending.span = Span {
                        start: new_range.start,
                        end: new_range.end,
                        text,
                    };
                }
            }
        }
    }

    fn clear_feedback(&mut self) {
        self.batch.clear();
        if let Some(pending) = self.pending.take() {
            self.document.release(pending.anchor);
        }
    }
}

/// Put the original paragraph's surrounding whitespace back around a rewrite
fn rewrap(original: &str, rewritten: &str) -> String {
    let leading = &original[..original.len() - original.trim_start().len()];
    let trailing = &original[original.trim_end().len()..];
    format!("{leading}{rewritten}{trailing}")
}
