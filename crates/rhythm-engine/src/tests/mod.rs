//! Session-level tests driving the assistant with a scripted model.


pub use scripted::ScriptedModel;

use std::sync::Arc;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use crate::assistant::{Agent, Assistant, Role};
use crate::editing::{Cmd, Document};
use crate::llm::{LlmError, ResponseFormat};
use crate::session::{
    ANALYSIS_FAILED_NOTICE, APPLIED_ALL_REPLY, APPLIED_REPLY, APPLY_CONFLICT_NOTICE,
    APPLY_FAILED_NOTICE, CHAT_FAILED_NOTICE, CHAT_FAILED_REPLY, EMPTY_REPLY, Outbound,
    REWRITE_SUPERSEDED_REPLY, Session,
};

const QUIET: Duration = Duration::from_millis(100);
const FIRST: &str = "First paragraph here.";
const SECOND: &str = "The cat sat on the mat, it was very happy.";
const TWO_SUGGESTIONS: &str = r#"{"suggestions":[
    {"category":"grammar","description":"Fix the comma splice."},
    {"category":"style","description":"Drop 'very'."}]}"#;

fn typed_session(online: bool) -> (Session, Instant) {
    let mut session = Session::new(Document::from_text(""), online).with_quiet_period(QUIET);
    let t0 = Instant::now();
    session.edit(
        Cmd::InsertText {
            at: 0,
            text: format!("{FIRST}\n\n{SECOND}"),
        },
        t0,
    );
    (session, t0)
}

fn assistant(model: ScriptedModel) -> (Assistant, Arc<ScriptedModel>) {
    let model = Arc::new(model);
    (Assistant::new(model.clone()), model)
}

/// Type, wait out the debounce, and feed the analysis answer back in
async fn analyzed_session(assistant: &Assistant) -> Session {
    let (mut session, t0) = typed_session(true);
    let outbound = session.poll(t0 + QUIET).expect("analysis is due");
    let inbound = assistant.execute(outbound).await;
    session.resolve(inbound);
    session
}

#[tokio::test]
async fn analysis_then_apply_one_keeps_sibling() {
    let (assistant, model) = assistant(
        ScriptedModel::new()
            .answer(TWO_SUGGESTIONS)
            .answer("The cat sat on the mat. It was very happy."),
    );
    let mut session = analyzed_session(&assistant).await;

    let suggestions = session.feedback().suggestions().to_vec();
    assert_eq!(suggestions.len(), 2);

    let outbound = session.apply_one(suggestions[0].id).unwrap();
    assert!(session.is_applying());
    assert!(session.chat().is_empty());
    session.resolve(assistant.execute(outbound).await);

    assert!(!session.is_applying());
    assert_eq!(session.chat().messages().len(), 1);
    let confirmation = session.chat().last().unwrap();
    assert_eq!(confirmation.role, Role::Model);
    assert_eq!(confirmation.agent, Some(Agent::Ghostwriter));
    assert_eq!(confirmation.text, APPLIED_REPLY);
    assert_eq!(
        session.document().text(),
        format!("{FIRST}\n\nThe cat sat on the mat. It was very happy.")
    );
    let remaining = session.feedback().suggestions();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, suggestions[1].id);
    assert_eq!(
        session.feedback().pending_span().map(|span| span.text.as_str()),
        Some("The cat sat on the mat. It was very happy.")
    );

    let requests = model.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].prompt.ends_with(&format!("--- PARAGRAPH ---\n{SECOND}")));
    assert!(matches!(requests[0].format, ResponseFormat::Json(_)));
    assert!(requests[1].prompt.ends_with("--- SUGGESTED EDIT ---\nFix the comma splice."));
}

#[tokio::test]
async fn apply_all_sends_every_suggestion_and_clears_batch() {
    let (assistant, model) = assistant(
        ScriptedModel::new()
            .answer(TWO_SUGGESTIONS)
            .answer("The cat sat on the mat. It was happy."),
    );
    let mut session = analyzed_session(&assistant).await;

    let outbound = session.apply_all().unwrap();
    session.resolve(assistant.execute(outbound).await);

    assert_eq!(
        session.document().text(),
        format!("{FIRST}\n\nThe cat sat on the mat. It was happy.")
    );
    assert!(session.feedback().suggestions().is_empty());
    assert!(session.feedback().pending_span().is_none());
    assert!(
        model.requests()[1]
            .prompt
            .ends_with("1. Fix the comma splice.\n2. Drop 'very'.")
    );

    assert_eq!(session.chat().messages().len(), 1);
    let confirmation = session.chat().last().unwrap();
    assert_eq!(confirmation.agent, Some(Agent::Ghostwriter));
    assert_eq!(confirmation.text, APPLIED_ALL_REPLY);
    assert_eq!(session.notice(), None);
}

#[tokio::test]
async fn rewrite_of_edited_paragraph_is_reported_by_ghostwriter() {
    let (assistant, _) = assistant(
        ScriptedModel::new()
            .answer(TWO_SUGGESTIONS)
            .answer("The cat sat on the mat. It was happy."),
    );
    let mut session = analyzed_session(&assistant).await;

    let outbound = session.apply_all().unwrap();
    // The user types inside the paragraph while the rewrite is in flight
    let inside = FIRST.len() + 2 + 5;
    session.edit(
        Cmd::InsertText {
            at: inside,
            text: "XX".into(),
        },
        Instant::now(),
    );
    session.resolve(assistant.execute(outbound).await);

    assert_eq!(
        session.document().text(),
        format!("{FIRST}\n\nThe cXXat sat on the mat, it was very happy.")
    );
    assert_eq!(session.notice(), Some(APPLY_CONFLICT_NOTICE));
    let report = session.chat().last().unwrap();
    assert_eq!(report.role, Role::Model);
    assert_eq!(report.agent, Some(Agent::Ghostwriter));
    assert_eq!(report.text, APPLY_CONFLICT_NOTICE);
}

#[tokio::test]
async fn failed_analysis_shows_notice_and_no_suggestions() {
    let (assistant, _) = assistant(
        ScriptedModel::new().fail(LlmError::Network("connection refused".into())),
    );
    let session = analyzed_session(&assistant).await;

    assert!(session.feedback().suggestions().is_empty());
    assert_eq!(session.notice(), Some(ANALYSIS_FAILED_NOTICE));
}

#[tokio::test]
async fn stale_failure_is_silent() {
    let (assistant, _) = assistant(ScriptedModel::new().fail(LlmError::RateLimited("429".into())));
    let (mut session, t0) = typed_session(true);
    let outbound = session.poll(t0 + QUIET).unwrap();

    // The user keeps typing before the answer arrives
    session.edit(Cmd::InsertText { at: 0, text: "Oh. ".into() }, t0 + QUIET * 2);
    session.resolve(assistant.execute(outbound).await);

    assert_eq!(session.notice(), None);
    assert!(session.feedback().suggestions().is_empty());
}

#[tokio::test]
async fn failed_rewrite_keeps_document_and_suggestions() {
    let (assistant, _) = assistant(
        ScriptedModel::new()
            .answer(TWO_SUGGESTIONS)
            .fail(LlmError::Api {
                status: 500,
                body: "internal".into(),
            }),
    );
    let mut session = analyzed_session(&assistant).await;
    let before = session.document().text();

    let outbound = session.apply_all().unwrap();
    session.resolve(assistant.execute(outbound).await);

    assert_eq!(session.document().text(), before);
    assert_eq!(session.notice(), Some(APPLY_FAILED_NOTICE));
    assert_eq!(session.feedback().suggestions().len(), 2);
    assert!(session.apply_all().is_some());
}

#[tokio::test]
async fn chat_reply_is_logged_with_persona() {
    let (assistant, model) =
        assistant(ScriptedModel::new().answer("Open with the storm instead."));
    let (mut session, _) = typed_session(true);

    let outbound = session.send_prompt("How should I start?").unwrap();
    assert!(session.is_chatting());
    session.resolve(assistant.execute(outbound).await);

    let messages = session.chat().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].agent, Some(Agent::Brainstormer));
    assert_eq!(messages[1].text, "Open with the storm instead.");
    assert!(
        model.requests()[0]
            .prompt
            .contains(&format!("--- DOCUMENT CONTENT ---\n{FIRST}\n\n{SECOND}\n\n--- USER REQUEST ---\nHow should I start?"))
    );
}

#[tokio::test]
async fn chat_failure_adds_fallback_entry() {
    let (assistant, _) = assistant(ScriptedModel::new().fail(LlmError::Auth("bad key".into())));
    let (mut session, _) = typed_session(true);

    let outbound = session.send_prompt("Hello?").unwrap();
    session.resolve(assistant.execute(outbound).await);

    assert_eq!(session.notice(), Some(CHAT_FAILED_NOTICE));
    assert_eq!(session.chat().last().map(|m| m.text.as_str()), Some(CHAT_FAILED_REPLY));
    assert!(!session.is_chatting());
}

#[tokio::test]
async fn empty_chat_answer_gets_placeholder() {
    let (assistant, _) = assistant(ScriptedModel::new().fail(LlmError::EmptyResponse));
    let (mut session, _) = typed_session(true);

    let outbound = session.send_prompt("Anything?").unwrap();
    session.resolve(assistant.execute(outbound).await);

    assert_eq!(session.notice(), None);
    assert_eq!(session.chat().last().map(|m| m.text.as_str()), Some(EMPTY_REPLY));
}

#[tokio::test]
async fn ghostwriter_replaces_document_when_unchanged() {
    let (assistant, _) = assistant(ScriptedModel::new().answer(
        r#"{"explanation":"Merged into one paragraph.","newContent":"A single, tighter paragraph."}"#,
    ));
    let (mut session, t0) = typed_session(true);
    session.select_agent(Agent::Ghostwriter);

    let outbound = session.send_prompt("Make it one paragraph.").unwrap();
    session.resolve(assistant.execute(outbound).await);

    assert_eq!(session.document().text(), "A single, tighter paragraph.");
    assert_eq!(
        session.chat().last().map(|m| m.text.as_str()),
        Some("Merged into one paragraph.")
    );
    // A replacement is not an edit: no analysis gets scheduled
    assert_eq!(session.next_deadline(), None);
    assert!(session.poll(t0 + QUIET * 10).is_none());
}

#[tokio::test]
async fn ghostwriter_rewrite_dropped_after_user_edit() {
    let (assistant, _) = assistant(ScriptedModel::new().answer(
        r#"{"explanation":"Rewrote it.","newContent":"Something else entirely."}"#,
    ));
    let (mut session, t0) = typed_session(true);
    session.select_agent(Agent::Ghostwriter);

    let outbound = session.send_prompt("Rewrite everything.").unwrap();
    session.edit(Cmd::InsertText { at: 0, text: "# ".into() }, t0);
    let before = session.document().text();
    session.resolve(assistant.execute(outbound).await);

    assert_eq!(session.document().text(), before);
    assert_eq!(
        session.chat().last().map(|m| m.text.as_str()),
        Some(REWRITE_SUPERSEDED_REPLY)
    );
}

#[tokio::test]
async fn busy_session_refuses_overlapping_calls() {
    let (assistant, _) = assistant(ScriptedModel::new().answer(TWO_SUGGESTIONS));
    let mut session = analyzed_session(&assistant).await;

    assert!(session.send_prompt("First question").is_some());
    assert!(session.send_prompt("Second question").is_none());
    assert!(session.apply_all().is_none());
    assert_eq!(session.chat().len(), 1);
}

#[tokio::test]
async fn apply_in_flight_refuses_chat() {
    let (assistant, _) = assistant(ScriptedModel::new().answer(TWO_SUGGESTIONS));
    let mut session = analyzed_session(&assistant).await;

    assert!(session.apply_all().is_some());
    assert!(session.send_prompt("Meanwhile...").is_none());
    assert!(session.chat().is_empty());
}

#[test]
fn offline_session_never_calls_out() {
    let (mut session, t0) = typed_session(false);
    let text = session.document().text();

    assert!(session.poll(t0 + QUIET).is_none());
    assert!(session.send_prompt("Anyone there?").is_none());
    assert!(session.apply_all().is_none());

    assert_eq!(session.document().text(), text);
    assert!(session.chat().is_empty());
    assert_eq!(session.notice(), None);
}
