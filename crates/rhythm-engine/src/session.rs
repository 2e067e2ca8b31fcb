//! Sans-IO orchestration of one editing session.
//!
//! [`Session`] owns every piece of mutable state the editor shows: the
//! feedback coordinator (and through it the document), the chat log, the
//! selected persona and the last user-visible notice. It never performs I/O.
//! Operations that need the model return an [`Outbound`] request; the caller
//! runs it (usually through [`Assistant::execute`](crate::assistant::Assistant::execute))
//! and hands the resulting [`Inbound`] back to [`Session::resolve`].

use std::time::{Duration, Instant};

use crate::assistant::{Agent, AgentReply, ChatLog, ChatMessage};
use crate::editing::{Cmd, Document, Patch};
use crate::feedback::{
    AnalysisTicket, ApplyError, ApplyScope, FeedbackCoordinator, Generation, Received,
    RewriteTicket, SuggestionDraft, SuggestionId,
};
use crate::llm::{LlmError, LlmResult};

pub const ANALYSIS_FAILED_NOTICE: &str = "Could not get feedback at this time.";
pub const APPLY_FAILED_NOTICE: &str = "Failed to apply feedback.";
pub const APPLIED_REPLY: &str = "I've applied the suggested edit to the paragraph.";
pub const APPLIED_ALL_REPLY: &str = "I've applied all suggested edits to the paragraph.";
pub const APPLY_CONFLICT_NOTICE: &str =
    "The paragraph changed while the edit was being prepared, so it was not applied.";
pub const CHAT_FAILED_NOTICE: &str = "An error occurred.";
pub const CHAT_FAILED_REPLY: &str = "An error occurred. Please check your API key and try again.";
pub const EMPTY_REPLY: &str = "Sorry, I couldn't generate a response.";
pub const REWRITE_SUPERSEDED_REPLY: &str =
    "The document changed while I was writing, so I left it as it is.";

/// A chat request ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTicket {
    pub agent: Agent,
    pub request: String,
    /// Full document text at the time of sending
    pub document: String,
    pub document_version: u64,
}

/// A model call the session wants made
#[derive(Debug, Clone)]
pub enum Outbound {
    Analyze(AnalysisTicket),
    Rewrite(RewriteTicket),
    Converse(ConversationTicket),
}

/// The result of an [`Outbound`] request
#[derive(Debug)]
pub enum Inbound {
    Analysis {
        generation: Generation,
        result: LlmResult<Vec<SuggestionDraft>>,
    },
    Rewrite {
        ticket: RewriteTicket,
        result: LlmResult<String>,
    },
    Conversation {
        ticket: ConversationTicket,
        result: LlmResult<AgentReply>,
    },
}

#[derive(Debug)]
pub struct Session {
    feedback: FeedbackCoordinator,
    chat: ChatLog,
    agent: Agent,
    notice: Option<String>,
    chatting: bool,
    applying: bool,
}

impl Session {
    /// `online` is false when no credential is configured
    pub fn new(document: Document, online: bool) -> Self {
        Self {
            feedback: FeedbackCoordinator::new(document, online),
            chat: ChatLog::new(),
            agent: Agent::default(),
            notice: None,
            chatting: false,
            applying: false,
        }
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.feedback = self.feedback.with_quiet_period(quiet_period);
        self
    }

    pub fn feedback(&self) -> &FeedbackCoordinator {
        &self.feedback
    }

    pub fn document(&self) -> &Document {
        self.feedback.document()
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn agent(&self) -> Agent {
        self.agent
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_online(&self) -> bool {
        self.feedback.is_online()
    }

    pub fn is_chatting(&self) -> bool {
        self.chatting
    }

    pub fn is_applying(&self) -> bool {
        self.applying
    }

    pub fn select_agent(&mut self, agent: Agent) {
        self.agent = agent;
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn edit(&mut self, cmd: Cmd, now: Instant) -> Patch {
        self.feedback.edit(cmd, now)
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.feedback.set_cursor(cursor);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.feedback.next_deadline()
    }

    /// Fire the debounce timer if due
    pub fn poll(&mut self, now: Instant) -> Option<Outbound> {
        self.feedback.poll(now).map(Outbound::Analyze)
    }

    pub fn apply_one(&mut self, id: SuggestionId) -> Option<Outbound> {
        self.begin_apply(ApplyScope::One(id))
    }

    pub fn apply_all(&mut self) -> Option<Outbound> {
        self.begin_apply(ApplyScope::All)
    }

    fn begin_apply(&mut self, scope: ApplyScope) -> Option<Outbound> {
        if self.chatting || self.applying {
            log::debug!("Apply refused: another request is in flight");
            return None;
        }
        let ticket = self.feedback.begin_apply(scope)?;
        self.notice = None;
        self.applying = true;
        log::info!(
            "Applying {} suggestion(s) to paragraph of {:?}",
            ticket.instructions.len(),
            ticket.generation
        );
        Some(Outbound::Rewrite(ticket))
    }

    pub fn dismiss(&mut self, id: SuggestionId) -> bool {
        self.feedback.dismiss(id)
    }

    /// Send a chat message to the selected persona
    ///
    /// Refused (returns `None`, changes nothing) when offline, when the text is
    /// blank, or while a chat or apply call is in flight.
    pub fn send_prompt(&mut self, text: &str) -> Option<Outbound> {
        if !self.is_online() || text.trim().is_empty() || self.chatting || self.applying {
            return None;
        }

        self.notice = None;
        self.chatting = true;
        self.chat.push(ChatMessage::user(text));

        let document = self.document();
        Some(Outbound::Converse(ConversationTicket {
            agent: self.agent,
            request: text.to_string(),
            document: document.text(),
            document_version: document.version(),
        }))
    }

    /// Fold a finished call back into the session
    pub fn resolve(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Analysis { generation, result } => self.resolve_analysis(generation, result),
            Inbound::Rewrite { ticket, result } => self.resolve_rewrite(ticket, result),
            Inbound::Conversation { ticket, result } => self.resolve_conversation(ticket, result),
        }
    }

    fn resolve_analysis(
        &mut self,
        generation: Generation,
        result: LlmResult<Vec<SuggestionDraft>>,
    ) {
        let (drafts, failed) = match result {
            Ok(drafts) => (drafts, false),
            Err(e) => {
                log::warn!("Analysis {generation:?} failed: {e}");
                (Vec::new(), true)
            }
        };

        match self.feedback.receive_analysis(generation, drafts) {
            Received::Stale => {}
            Received::Accepted(count) => {
                log::debug!("Analysis {generation:?} produced {count} suggestion(s)");
                if failed {
                    self.notice = Some(ANALYSIS_FAILED_NOTICE.to_string());
                }
            }
        }
    }

    fn resolve_rewrite(&mut self, ticket: RewriteTicket, result: LlmResult<String>) {
        self.applying = false;

        let replacement = match result {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Rewrite for {:?} failed: {e}", ticket.generation);
                self.feedback.abandon_apply(ticket);
                self.notice = Some(APPLY_FAILED_NOTICE.to_string());
                return;
            }
        };

        match self.feedback.finish_apply(ticket, &replacement) {
            Ok(outcome) => {
                log::info!(
                    "Applied rewrite at {}..{}",
                    outcome.range.start,
                    outcome.range.end
                );
                let reply = match outcome.scope {
                    ApplyScope::One(_) => APPLIED_REPLY,
                    ApplyScope::All => APPLIED_ALL_REPLY,
                };
                self.chat.push(ChatMessage::model(Agent::Ghostwriter, reply));
            }
            Err(ApplyError::Conflict) => {
                self.chat
                    .push(ChatMessage::model(Agent::Ghostwriter, APPLY_CONFLICT_NOTICE));
                self.notice = Some(APPLY_CONFLICT_NOTICE.to_string());
            }
            Err(ApplyError::EmptyReplacement) => {
                log::warn!("Rewrite came back empty");
                self.notice = Some(APPLY_FAILED_NOTICE.to_string());
            }
        }
    }

    fn resolve_conversation(
        &mut self,
        ticket: ConversationTicket,
        result: LlmResult<AgentReply>,
    ) {
        self.chatting = false;

        let reply = match result {
            Ok(reply) => reply,
            Err(LlmError::EmptyResponse) => {
                self.chat.push(ChatMessage::model(ticket.agent, EMPTY_REPLY));
                return;
            }
            Err(e) => {
                log::warn!("{} request failed: {e}", ticket.agent);
                self.notice = Some(CHAT_FAILED_NOTICE.to_string());
                self.chat
                    .push(ChatMessage::model(ticket.agent, CHAT_FAILED_REPLY));
                return;
            }
        };

        let AgentReply {
            display_text,
            suggestions,
            replacement_document,
        } = reply;
        let display_text = if display_text.is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            display_text
        };

        if let Some(new_content) = replacement_document {
            if self.document().version() != ticket.document_version {
                log::info!("Document changed during ghostwriter call; rewrite dropped");
                self.chat
                    .push(ChatMessage::model(ticket.agent, REWRITE_SUPERSEDED_REPLY));
                return;
            }
            self.feedback.replace_document(&new_content);
        }

        self.chat
            .push(ChatMessage::model(ticket.agent, display_text).with_suggestions(suggestions));
    }
}
