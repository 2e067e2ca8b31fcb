use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of problem a suggestion addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Grammar,
    Style,
    Clarity,
    Structure,
    #[serde(other)]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Grammar => "grammar",
            Category::Style => "style",
            Category::Clarity => "clarity",
            Category::Structure => "structure",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locally generated identity of one suggestion
///
/// Never supplied by the model and never reused, so a suggestion can be
/// applied or dismissed regardless of where it sits in its batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuggestionId(pub Uuid);

impl SuggestionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SuggestionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A suggestion as the model returns it, before it gets an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionDraft {
    pub category: Category,
    pub description: String,
}

impl SuggestionDraft {
    pub fn new(category: Category, description: impl Into<String>) -> Self {
        Self {
            category,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub category: Category,
    pub description: String,
}

impl Suggestion {
    /// Stamp a draft with a fresh id
    pub fn from_draft(draft: SuggestionDraft) -> Self {
        Self {
            id: SuggestionId::new(),
            category: draft.category,
            description: draft.description,
        }
    }
}

/// Stamp a whole batch, dropping drafts with nothing to say
pub fn stamp_batch(drafts: Vec<SuggestionDraft>) -> Vec<Suggestion> {
    drafts
        .into_iter()
        .filter(|draft| !draft.description.trim().is_empty())
        .map(Suggestion::from_draft)
        .collect()
}
