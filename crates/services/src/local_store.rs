//! Best-effort persistence of the conversation list under one key.
//!
//! Reads never fail: a missing, unreadable or corrupt value loads as an empty
//! list. Writes that fail are logged and dropped; the in-memory list stays
//! authoritative for the rest of the session.

use crate::kv_store::KeyValueStore;
use shared::conversation::Conversation;

pub const CONVERSATIONS_KEY: &str = "conversations";

pub struct LocalStore {
    backend: Box<dyn KeyValueStore>,
}

impl LocalStore {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    pub fn load(&self) -> Vec<Conversation> {
        let raw = match self.backend.get_item(CONVERSATIONS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => "[]".to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored conversations");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Conversation>>(&raw) {
            Ok(conversations) => {
                tracing::debug!(count = conversations.len(), "loaded conversations");
                conversations
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored conversations are corrupt, starting empty");
                Vec::new()
            }
        }
    }

    pub fn save(&self, conversations: &[Conversation]) {
        let json = match serde_json::to_string(conversations) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "could not serialize conversations");
                return;
            }
        };
        if let Err(e) = self.backend.set_item(CONVERSATIONS_KEY, &json) {
            tracing::warn!(
                backend = self.backend.backend_name(),
                error = %e,
                "persisting conversations failed"
            );
        }
    }
}
