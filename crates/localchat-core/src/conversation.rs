//! Conversation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::Message;
use crate::ids::ConversationId;

/// Title used until a conversation has a first message.
pub const DEFAULT_TITLE: &str = "New conversation";

/// Number of characters of the first message used as the title.
pub const TITLE_MAX_CHARS: usize = 50;

/// A stored chat thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub messages: Vec<Message>,
    /// Model selected when the conversation was created.
    pub model: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new(id: ConversationId, model: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            model: model.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the transcript, re-deriving the title and bumping `updated_at`.
    pub fn sync_messages(&mut self, messages: &[Message]) {
        self.messages = messages.to_vec();
        self.title = derive_title(&self.messages);
        self.updated_at = Utc::now();
    }
}

/// First 50 characters of the first message, or the default title.
pub fn derive_title(messages: &[Message]) -> String {
    match messages.first() {
        Some(first) if !first.content.is_empty() => {
            first.content.chars().take(TITLE_MAX_CHARS).collect()
        }
        _ => DEFAULT_TITLE.to_string(),
    }
}
