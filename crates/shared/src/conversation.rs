//! Conversation records as they are kept in memory and persisted.

use crate::agent_api::{ChatMessage, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder title until the first user message names the conversation.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Shown in lists for conversations whose title is blank.
pub const UNTITLED: &str = "Untitled";

pub const TITLE_MAX_CHARS: usize = 40;

/// A named, ordered sequence of chat messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_TITLE
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// Append a message. A user message names a conversation that still has
    /// the placeholder title.
    pub fn add_message(&mut self, msg: ChatMessage) {
        if msg.role == Role::User && self.has_default_title() {
            self.title = derive_title(&msg.content);
        }
        self.messages.push(msg);
        self.updated_at = Utc::now();
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.updated_at = Utc::now();
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.trim().to_string();
        self.updated_at = Utc::now();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// First line of the trimmed content, cut to [`TITLE_MAX_CHARS`] characters.
pub fn derive_title(content: &str) -> String {
    content
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(TITLE_MAX_CHARS)
        .collect()
}
