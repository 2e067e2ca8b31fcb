pub mod assistant;
pub mod editing;
pub mod feedback;
pub mod llm;
pub mod session;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use assistant::{Agent, AgentReply, Assistant, ChatLog, ChatMessage, Role};
pub use editing::{Cmd, Document, Patch};
pub use feedback::{
    ApplyError, ApplyScope, Category, FeedbackCoordinator, Generation, Phase, Suggestion,
    SuggestionId,
};
pub use llm::{GeminiModel, GenerateRequest, LanguageModel, LlmError, LlmResult};
pub use session::{Inbound, Outbound, Session};
