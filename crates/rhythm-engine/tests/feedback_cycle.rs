//! Debounce, stale-response and apply behavior of the feedback coordinator,
//! driven with synthetic clock readings.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use rstest::rstest;

use rhythm_engine::editing::{Cmd, Document};
use rhythm_engine::feedback::{
    ApplyError, ApplyScope, Category, FeedbackCoordinator, Phase, QUIET_PERIOD, Received,
    SuggestionDraft,
};

const INTRO: &str = "Short line.";
const BODY: &str = "This second paragraph is definitely long enough to qualify for analysis here.";

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn drafts() -> Vec<SuggestionDraft> {
    vec![
        SuggestionDraft::new(Category::Clarity, "Say what it qualifies for."),
        SuggestionDraft::new(Category::Style, "Drop 'definitely'."),
    ]
}

/// Type `text` in one go at `t0` and return the coordinator
fn typed(text: &str, online: bool) -> (FeedbackCoordinator, Instant) {
    let mut feedback = FeedbackCoordinator::new(Document::from_text(""), online);
    let t0 = Instant::now();
    feedback.edit(
        Cmd::InsertText {
            at: 0,
            text: text.to_string(),
        },
        t0,
    );
    (feedback, t0)
}

/// Coordinator with suggestions on offer for BODY
fn with_suggestions() -> FeedbackCoordinator {
    let (mut feedback, t0) = typed(&format!("{INTRO}\n\n{BODY}"), true);
    let ticket = feedback.poll(t0 + QUIET_PERIOD).unwrap();
    assert_eq!(ticket.span.text, BODY);
    assert_eq!(feedback.receive_analysis(ticket.generation, drafts()), Received::Accepted(2));
    feedback
}

#[test]
fn burst_of_edits_issues_one_call_after_last_edit() {
    let (mut feedback, t0) = typed("The first words", true);

    feedback.edit(Cmd::InsertText { at: 15, text: " of a".into() }, t0 + ms(500));
    let last = t0 + ms(1000);
    feedback.edit(Cmd::InsertText { at: 20, text: " longer paragraph.".into() }, last);

    assert_eq!(feedback.next_deadline(), Some(last + QUIET_PERIOD));
    assert!(feedback.poll(t0 + QUIET_PERIOD).is_none());
    assert!(feedback.poll(last + QUIET_PERIOD - ms(1)).is_none());

    let ticket = feedback.poll(last + QUIET_PERIOD).unwrap();
    assert_eq!(ticket.span.text, "The first words of a longer paragraph.");
    assert!(feedback.poll(last + QUIET_PERIOD * 3).is_none());
    assert!(feedback.is_analyzing());
}

#[test]
fn paragraph_is_located_at_fire_time() {
    let (mut feedback, t0) = typed(&format!("{BODY}\n\nAnother paragraph that is long enough too."), true);

    // Cursor moves back into the first paragraph before the timer fires
    feedback.set_cursor(5);

    let ticket = feedback.poll(t0 + QUIET_PERIOD).unwrap();
    assert_eq!(ticket.span.text, BODY);
    assert_eq!(ticket.span.range(), 0..BODY.len());
}

#[test]
fn short_paragraph_issues_nothing() {
    let (mut feedback, t0) = typed("Hi.\n\nBye.\n\n", true);
    feedback.set_cursor(1);

    assert!(feedback.poll(t0 + QUIET_PERIOD).is_none());
    assert_eq!(feedback.phase(), Phase::Idle);
}

#[test]
fn edit_clears_displayed_feedback_immediately() {
    let mut feedback = with_suggestions();

    feedback.edit(Cmd::InsertText { at: 0, text: "x".into() }, Instant::now());

    assert!(feedback.suggestions().is_empty());
    assert!(feedback.pending_span().is_none());
    assert!(matches!(feedback.phase(), Phase::Waiting { .. }));
}

#[test]
fn superseded_response_is_dropped() {
    let (mut feedback, t0) = typed(&format!("{INTRO}\n\n{BODY}"), true);
    let first = feedback.poll(t0 + QUIET_PERIOD).unwrap();

    let t1 = t0 + ms(2000);
    feedback.edit(Cmd::InsertText { at: 0, text: "Very ".into() }, t1);
    let second = feedback.poll(t1 + QUIET_PERIOD).unwrap();
    assert_ne!(first.generation, second.generation);

    assert_eq!(feedback.receive_analysis(first.generation, drafts()), Received::Stale);
    assert!(feedback.suggestions().is_empty());
    assert!(feedback.begin_apply(ApplyScope::All).is_none());

    assert_eq!(
        feedback.receive_analysis(second.generation, drafts()),
        Received::Accepted(2)
    );
}

#[test]
fn response_after_edit_without_new_cycle_is_dropped() {
    let (mut feedback, t0) = typed(&format!("{INTRO}\n\n{BODY}"), true);
    let ticket = feedback.poll(t0 + QUIET_PERIOD).unwrap();
    let before = feedback.document().text();

    feedback.edit(Cmd::InsertText { at: 0, text: "A".into() }, t0 + ms(1600));
    let text = feedback.document().text();

    assert_eq!(feedback.receive_analysis(ticket.generation, drafts()), Received::Stale);
    assert!(feedback.suggestions().is_empty());
    assert_eq!(feedback.document().text(), text);
    assert_ne!(text, before);
}

#[test]
fn empty_batch_clears_context() {
    let (mut feedback, t0) = typed(&format!("{INTRO}\n\n{BODY}"), true);
    let ticket = feedback.poll(t0 + QUIET_PERIOD).unwrap();

    assert_eq!(feedback.receive_analysis(ticket.generation, vec![]), Received::Accepted(0));
    assert!(feedback.pending_span().is_none());
    assert!(feedback.begin_apply(ApplyScope::All).is_none());
}

#[test]
fn apply_one_leaves_siblings_appliable() {
    let mut feedback = with_suggestions();
    let ids: Vec<_> = feedback.suggestions().iter().map(|s| s.id).collect();

    let ticket = feedback.begin_apply(ApplyScope::One(ids[0])).unwrap();
    assert_eq!(ticket.instructions, vec!["Say what it qualifies for.".to_string()]);
    let rewritten = "This second paragraph is definitely long enough to be analyzed.";
    let outcome = feedback.finish_apply(ticket, rewritten).unwrap();

    assert_eq!(feedback.document().text(), format!("{INTRO}\n\n{rewritten}"));
    assert_eq!(outcome.range, INTRO.len() + 2..INTRO.len() + 2 + rewritten.len());
    let remaining: Vec<_> = feedback.suggestions().iter().map(|s| s.id).collect();
    assert_eq!(remaining, vec![ids[1]]);

    let sibling = feedback.begin_apply(ApplyScope::One(ids[1])).unwrap();
    assert_eq!(sibling.original, rewritten);
    feedback
        .finish_apply(sibling, "This second paragraph is long enough to be analyzed.")
        .unwrap();

    assert!(feedback.suggestions().is_empty());
    assert_eq!(
        feedback.document().text(),
        format!("{INTRO}\n\nThis second paragraph is long enough to be analyzed.")
    );
}

#[test]
fn applying_unknown_suggestion_is_noop() {
    let mut feedback = with_suggestions();
    let id = feedback.suggestions()[0].id;
    assert!(feedback.dismiss(id));

    assert!(feedback.begin_apply(ApplyScope::One(id)).is_none());
    assert_eq!(feedback.suggestions().len(), 1);
}

#[test]
fn apply_all_splices_at_captured_bounds() {
    let mut feedback = with_suggestions();
    let span = feedback.pending_span().cloned().unwrap();
    let version = feedback.document().version();

    let ticket = feedback.begin_apply(ApplyScope::All).unwrap();
    assert_eq!(ticket.instructions.len(), 2);
    let outcome = feedback
        .finish_apply(ticket, "  A tighter second paragraph, long enough.\n")
        .unwrap();

    assert_eq!(outcome.range.start, span.start);
    assert_eq!(
        feedback.document().text(),
        format!("{INTRO}\n\nA tighter second paragraph, long enough.")
    );
    assert_eq!(feedback.document().version(), version + 1);
    assert!(feedback.suggestions().is_empty());
    assert!(feedback.pending_span().is_none());
    // Applying is not typing
    assert_eq!(feedback.phase(), Phase::Idle);
}

#[test]
fn rewrite_follows_paragraph_moved_by_earlier_edit() {
    let mut feedback = with_suggestions();
    let ticket = feedback.begin_apply(ApplyScope::All).unwrap();

    feedback.edit(Cmd::InsertText { at: 0, text: "# Title\n\n".into() }, Instant::now());
    let outcome = feedback.finish_apply(ticket, "Rewritten body paragraph.").unwrap();

    assert_eq!(
        feedback.document().text(),
        format!("# Title\n\n{INTRO}\n\nRewritten body paragraph.")
    );
    assert_eq!(outcome.range.start, "# Title\n\n".len() + INTRO.len() + 2);
}

#[test]
fn rewrite_of_changed_paragraph_is_a_conflict() {
    let mut feedback = with_suggestions();
    let ticket = feedback.begin_apply(ApplyScope::All).unwrap();

    let inside = INTRO.len() + 2 + 5;
    feedback.edit(Cmd::InsertText { at: inside, text: "XX".into() }, Instant::now());
    let before = feedback.document().text();

    assert_eq!(
        feedback.finish_apply(ticket, "Rewritten body paragraph."),
        Err(ApplyError::Conflict)
    );
    assert_eq!(feedback.document().text(), before);
}

#[rstest]
#[case("")]
#[case("   \n  ")]
fn blank_rewrite_is_rejected(#[case] replacement: &str) {
    let mut feedback = with_suggestions();
    let before = feedback.document().text();
    let ticket = feedback.begin_apply(ApplyScope::All).unwrap();

    assert_eq!(
        feedback.finish_apply(ticket, replacement),
        Err(ApplyError::EmptyReplacement)
    );
    assert_eq!(feedback.document().text(), before);
    assert_eq!(feedback.suggestions().len(), 2);
}

#[test]
fn rewrite_keeps_paragraph_indentation() {
    let text = format!("{INTRO}\n\n    {BODY}  ");
    let (mut feedback, t0) = typed(&text, true);
    let ticket = feedback.poll(t0 + QUIET_PERIOD).unwrap();
    feedback.receive_analysis(ticket.generation, drafts());

    let apply = feedback.begin_apply(ApplyScope::All).unwrap();
    feedback.finish_apply(apply, "Shorter body text here.").unwrap();

    assert_eq!(
        feedback.document().text(),
        format!("{INTRO}\n\n    Shorter body text here.  ")
    );
}

#[test]
fn offline_coordinator_never_issues_tickets() {
    let (mut feedback, t0) = typed(&format!("{INTRO}\n\n{BODY}"), false);
    let text = feedback.document().text();

    assert!(feedback.poll(t0 + QUIET_PERIOD).is_none());
    assert!(feedback.poll(t0 + QUIET_PERIOD * 2).is_none());
    assert!(feedback.begin_apply(ApplyScope::All).is_none());
    assert_eq!(feedback.document().text(), text);
    assert_eq!(feedback.phase(), Phase::Idle);
}
