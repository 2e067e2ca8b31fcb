//! Talking to the model: personas, prompts, reply interpretation and the
//! async executor that turns a session's outbound requests into responses.

pub mod agents;
pub mod chat;
pub mod prompts;

pub use agents::{Agent, AgentReply, interpret_reply};
pub use chat::{ChatLog, ChatMessage, Role};

use std::sync::Arc;

use crate::feedback::SuggestionDraft;
use crate::llm::{GenerateRequest, LanguageModel, LlmResult};
use crate::session::{Inbound, Outbound};

/// Executes model calls on behalf of a [`Session`](crate::session::Session)
///
/// Each method makes exactly one model call. Nothing is retried.
#[derive(Clone)]
pub struct Assistant {
    model: Arc<dyn LanguageModel>,
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("model", &self.model.name())
            .finish()
    }
}

impl Assistant {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Ask for suggestions on one paragraph
    pub async fn analyze(&self, paragraph: &str) -> LlmResult<Vec<SuggestionDraft>> {
        let request =
            GenerateRequest::json(prompts::feedback_prompt(paragraph), prompts::suggestion_schema());
        let raw = self.model.generate(request).await?;
        prompts::parse_suggestions(&raw)
    }

    /// Ask for the paragraph rewritten to incorporate the given suggestions
    pub async fn rewrite(&self, original: &str, instructions: &[String]) -> LlmResult<String> {
        let request = GenerateRequest::text(prompts::rewrite_prompt(original, instructions));
        self.model.generate(request).await
    }

    /// Send a chat request to a persona along with the whole document
    pub async fn converse(
        &self,
        agent: Agent,
        request: &str,
        document: &str,
    ) -> LlmResult<AgentReply> {
        let prompt = prompts::conversation_prompt(agent.persona(), document, request);
        let raw = self
            .model
            .generate(GenerateRequest {
                prompt,
                format: agent.response_format(),
            })
            .await?;
        Ok(interpret_reply(agent, &raw))
    }

    /// Carry out one outbound request and package the result for the session
    pub async fn execute(&self, outbound: Outbound) -> Inbound {
        match outbound {
            Outbound::Analyze(ticket) => {
                log::debug!(
                    "Analyzing paragraph {}..{} for {:?}",
                    ticket.span.start,
                    ticket.span.end,
                    ticket.generation
                );
                let result = self.analyze(&ticket.span.text).await;
                Inbound::Analysis {
                    generation: ticket.generation,
                    result,
                }
            }
            Outbound::Rewrite(ticket) => {
                let result = self.rewrite(&ticket.original, &ticket.instructions).await;
                Inbound::Rewrite { ticket, result }
            }
            Outbound::Converse(ticket) => {
                let result = self
                    .converse(ticket.agent, &ticket.request, &ticket.document)
                    .await;
                Inbound::Conversation { ticket, result }
            }
        }
    }
}
