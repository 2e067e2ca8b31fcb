use crate::assistant::agents::Agent;
use crate::feedback::Suggestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    /// Persona that produced a model message; `None` for user messages
    pub agent: Option<Agent>,
    pub text: String,
    pub suggestions: Vec<Suggestion>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            agent: None,
            text: text.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn model(agent: Agent, text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            agent: Some(agent),
            text: text.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<Suggestion>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Label shown above the message
    pub fn author(&self) -> &'static str {
        match (self.role, self.agent) {
            (Role::User, _) => "You",
            (Role::Model, Some(agent)) => agent.name(),
            (Role::Model, None) => "Assistant",
        }
    }
}

/// Append-only conversation history
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
