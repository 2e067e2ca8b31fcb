use serde::Deserialize;

use crate::assistant::prompts::{critique_schema, rewrite_document_schema, strip_code_fence};
use crate::feedback::{Suggestion, SuggestionDraft};
use crate::feedback::suggestion::stamp_batch;
use crate::llm::ResponseFormat;

const BRAINSTORMER_PROMPT: &str = "You are a creative brainstorming partner. Help the user explore ideas, angles and directions for their writing. Be expansive and encouraging, and offer several distinct possibilities. Do not rewrite the document.";

const EDITOR_PROMPT: &str = "You are a meticulous editor. Review the document for grammar, spelling, style and clarity problems. Give a short summary reply to the user's request and a list of concrete suggestions, each classified as grammar, style, clarity, structure or other. Do not rewrite the document yourself.";

const GHOSTWRITER_PROMPT: &str = "You are a skilled ghostwriter. Rewrite or extend the document as the user requests, preserving their voice. Return the complete new document in newContent and a brief explanation of what you changed in explanation.";

/// Chat personas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Agent {
    #[default]
    Brainstormer,
    Editor,
    Ghostwriter,
}

impl Agent {
    pub const ALL: [Agent; 3] = [Agent::Brainstormer, Agent::Editor, Agent::Ghostwriter];

    pub fn name(&self) -> &'static str {
        match self {
            Agent::Brainstormer => "Brainstormer",
            Agent::Editor => "Editor",
            Agent::Ghostwriter => "Ghostwriter",
        }
    }

    pub fn persona(&self) -> &'static str {
        match self {
            Agent::Brainstormer => BRAINSTORMER_PROMPT,
            Agent::Editor => EDITOR_PROMPT,
            Agent::Ghostwriter => GHOSTWRITER_PROMPT,
        }
    }

    /// Answer shape requested from the model for this persona
    pub fn response_format(&self) -> ResponseFormat {
        match self {
            Agent::Brainstormer => ResponseFormat::Text,
            Agent::Editor => ResponseFormat::Json(critique_schema()),
            Agent::Ghostwriter => ResponseFormat::Json(rewrite_document_schema()),
        }
    }
}

impl std::fmt::Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A persona's answer, interpreted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgentReply {
    /// What goes into the chat log
    pub display_text: String,
    pub suggestions: Vec<Suggestion>,
    /// Whole-document rewrite proposed by the ghostwriter
    pub replacement_document: Option<String>,
}

impl AgentReply {
    fn plain(text: &str) -> Self {
        Self {
            display_text: text.trim().to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct Critique {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    suggestions: Vec<SuggestionDraft>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRewrite {
    #[serde(default)]
    explanation: String,
    new_content: String,
}

/// Turn a persona's raw answer into a reply
///
/// Never fails: anything that does not parse as the persona's structured shape
/// is shown verbatim.
pub fn interpret_reply(agent: Agent, raw: &str) -> AgentReply {
    match agent {
        Agent::Brainstormer => AgentReply::plain(raw),
        Agent::Editor => match serde_json::from_str::<Critique>(strip_code_fence(raw)) {
            Ok(critique) => AgentReply {
                display_text: critique.summary.trim().to_string(),
                suggestions: stamp_batch(critique.suggestions),
                replacement_document: None,
            },
            Err(e) => {
                log::debug!("Editor reply was not a critique ({e}); showing as text");
                AgentReply::plain(raw)
            }
        },
        Agent::Ghostwriter => match serde_json::from_str::<DocumentRewrite>(strip_code_fence(raw))
        {
            Ok(rewrite) => AgentReply {
                display_text: rewrite.explanation.trim().to_string(),
                suggestions: Vec::new(),
                replacement_document: Some(rewrite.new_content),
            },
            Err(e) => {
                log::debug!("Ghostwriter reply was not a rewrite ({e}); showing as text");
                AgentReply::plain(raw)
            }
        },
    }
}
