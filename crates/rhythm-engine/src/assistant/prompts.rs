//! Prompt templates and response schemas.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::feedback::SuggestionDraft;
use crate::llm::{LlmError, LlmResult};

const LIVE_FEEDBACK_PROMPT: &str = "You are a subtle writing assistant. You will be given a single paragraph of text. Offer at most three concise, constructive suggestions for improving it, each 20-30 words, and classify each as grammar, style, clarity, structure or other. If the paragraph has no obvious issues, return an empty list. Do not be conversational.";

const REWRITE_PROMPT: &str = "Based on the following paragraph and the suggested edit, please rewrite the paragraph to incorporate the feedback. Return ONLY the rewritten paragraph text, with no extra formatting or explanation.";

/// Markdown code fences some models wrap JSON in despite being asked not to
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\s*```\s*$").expect("valid code fence pattern")
});

/// Analysis prompt for one paragraph
pub fn feedback_prompt(paragraph: &str) -> String {
    format!("{LIVE_FEEDBACK_PROMPT}\n\n--- PARAGRAPH ---\n{paragraph}")
}

/// Rewrite prompt for one or more suggestions
pub fn rewrite_prompt(original: &str, instructions: &[String]) -> String {
    let edits = match instructions {
        [single] => format!("--- SUGGESTED EDIT ---\n{single}"),
        many => {
            let list = many
                .iter()
                .enumerate()
                .map(|(i, instruction)| format!("{}. {instruction}", i + 1))
                .collect::<Vec<_>>()
                .join("\n");
            format!("--- SUGGESTED EDITS ---\n{list}")
        }
    };
    format!("{REWRITE_PROMPT}\n\n--- ORIGINAL PARAGRAPH ---\n{original}\n\n{edits}")
}

/// Chat prompt: persona, then the whole document, then the user's request
pub fn conversation_prompt(persona: &str, document: &str, request: &str) -> String {
    format!(
        "{persona}\n\n--- DOCUMENT CONTENT ---\n{document}\n\n--- USER REQUEST ---\n{request}"
    )
}

fn suggestion_item_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "category": {
                "type": "STRING",
                "enum": ["grammar", "style", "clarity", "structure", "other"]
            },
            "description": { "type": "STRING" }
        },
        "required": ["category", "description"]
    })
}

/// `{ suggestions: [{category, description}] }`
pub fn suggestion_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "suggestions": { "type": "ARRAY", "items": suggestion_item_schema() }
        },
        "required": ["suggestions"]
    })
}

/// `{ summary, suggestions: [{category, description}] }`
pub fn critique_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "suggestions": { "type": "ARRAY", "items": suggestion_item_schema() }
        },
        "required": ["summary", "suggestions"]
    })
}

/// `{ explanation, newContent }`
pub fn rewrite_document_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "explanation": { "type": "STRING" },
            "newContent": { "type": "STRING" }
        },
        "required": ["explanation", "newContent"]
    })
}

/// Drop a surrounding code fence, if any
pub fn strip_code_fence(raw: &str) -> &str {
    match CODE_FENCE.captures(raw).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw.trim(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuggestionPayload {
    Wrapped { suggestions: Vec<SuggestionDraft> },
    Bare(Vec<SuggestionDraft>),
}

/// Parse an analysis answer into drafts
pub fn parse_suggestions(raw: &str) -> LlmResult<Vec<SuggestionDraft>> {
    let payload: SuggestionPayload = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| LlmError::Malformed(e.to_string()))?;

    Ok(match payload {
        SuggestionPayload::Wrapped { suggestions } => suggestions,
        SuggestionPayload::Bare(suggestions) => suggestions,
    })
}
