//! In-memory conversation list with the current selection.
//!
//! Every mutation writes the whole list back through [`LocalStore`].
//! Once [`ConversationStore::ensure_default`] has run the list is never empty
//! and the selection always names a member of it.

use crate::local_store::LocalStore;
use shared::agent_api::{ChatMessage, Role};
use shared::conversation::Conversation;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
    #[error("No conversation selected")]
    NoSelection,
}

pub struct ConversationStore {
    conversations: Vec<Conversation>,
    current_id: Option<String>,
    local: LocalStore,
}

impl ConversationStore {
    /// Load persisted conversations and make sure one is selected.
    pub fn open(local: LocalStore) -> Self {
        let conversations = local.load();
        let mut store = Self {
            conversations,
            current_id: None,
            local,
        };
        store.ensure_default();
        store
    }

    /// Seed an empty list with one conversation and select the first
    /// conversation when nothing (or a stale id) is selected.
    pub fn ensure_default(&mut self) {
        if self.conversations.is_empty() {
            let conv = Conversation::new();
            tracing::info!(id = %conv.id, "created initial conversation");
            self.conversations.push(conv);
            self.persist();
        }

        let selection_valid = self
            .current_id
            .as_deref()
            .is_some_and(|id| self.get(id).is_some());
        if !selection_valid {
            if let Some(stale) = &self.current_id {
                tracing::warn!(id = %stale, "selected conversation vanished, selecting first");
            }
            self.current_id = self.conversations.first().map(|c| c.id.clone());
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Conversation, StoreError> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))
    }

    pub fn current(&self) -> Result<&Conversation, StoreError> {
        let id = self.current_id.as_deref().ok_or(StoreError::NoSelection)?;
        self.get(id)
            .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))
    }

    pub fn select(&mut self, id: &str) -> Result<(), StoreError> {
        if self.get(id).is_none() {
            return Err(StoreError::ConversationNotFound(id.to_string()));
        }
        self.current_id = Some(id.to_string());
        Ok(())
    }

    /// Insert a fresh conversation at the front, select it and persist.
    pub fn create_new(&mut self) -> String {
        let conv = Conversation::new();
        let id = conv.id.clone();
        tracing::info!(id = %id, "new conversation");
        self.conversations.insert(0, conv);
        self.current_id = Some(id.clone());
        self.persist();
        id
    }

    pub fn append_message(
        &mut self,
        id: &str,
        role: Role,
        content: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.get_mut(id)?.add_message(ChatMessage::new(role, content));
        self.persist();
        Ok(())
    }

    /// Append a user prompt and its reply together, persisting once.
    pub fn append_exchange(
        &mut self,
        id: &str,
        prompt: ChatMessage,
        reply: ChatMessage,
    ) -> Result<(), StoreError> {
        let conv = self.get_mut(id)?;
        conv.add_message(prompt);
        conv.add_message(reply);
        self.persist();
        Ok(())
    }

    pub fn clear_messages(&mut self, id: &str) -> Result<(), StoreError> {
        self.get_mut(id)?.clear_messages();
        self.persist();
        Ok(())
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<(), StoreError> {
        self.get_mut(id)?.set_title(title);
        self.persist();
        Ok(())
    }

    /// Write the full list back. Failures are swallowed by [`LocalStore`].
    pub fn persist(&self) {
        self.local.save(&self.conversations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv_store::{KeyValueStore, MemoryStore};
    use crate::local_store::tests::BrokenStore;
    use crate::local_store::CONVERSATIONS_KEY;
    use shared::conversation::DEFAULT_TITLE;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Shares one [`MemoryStore`] between several store instances.
    #[derive(Clone, Default)]
    struct SharedMemory(Arc<MemoryStore>);

    impl KeyValueStore for SharedMemory {
        fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.0.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.0.set_item(key, value)
        }

        fn backend_name(&self) -> &'static str {
            "shared-memory"
        }
    }

    fn open(memory: &SharedMemory) -> ConversationStore {
        ConversationStore::open(LocalStore::new(Box::new(memory.clone())))
    }

    #[test]
    fn test_open_seeds_and_persists_default() {
        let memory = SharedMemory::default();
        let store = open(&memory);

        assert_eq!(store.len(), 1);
        let current = store.current().unwrap();
        assert_eq!(current.title, DEFAULT_TITLE);
        assert!(current.messages.is_empty());

        let raw = memory.get_item(CONVERSATIONS_KEY).unwrap().unwrap();
        assert!(raw.contains(&current.id));
    }

    #[test]
    fn test_open_with_corrupt_blob_recovers() {
        let memory = SharedMemory::default();
        memory.set_item(CONVERSATIONS_KEY, "definitely not json").unwrap();
        let store = open(&memory);
        assert_eq!(store.len(), 1);
        assert!(store.current().is_ok());
    }

    #[test]
    fn test_open_selects_first_existing() {
        let memory = SharedMemory::default();
        let first_id = {
            let mut store = open(&memory);
            store.create_new();
            store.conversations()[0].id.clone()
        };
        let reopened = open(&memory);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.current_id(), Some(first_id.as_str()));
    }

    #[test]
    fn test_create_new_goes_to_front_and_is_selected() {
        let memory = SharedMemory::default();
        let mut store = open(&memory);
        let old_id = store.current_id().unwrap().to_string();
        store
            .append_message(&old_id, Role::User, "White Widow")
            .unwrap();
        let before = store.get(&old_id).unwrap().clone();

        let new_id = store.create_new();

        assert_eq!(store.conversations()[0].id, new_id);
        assert_eq!(store.current_id(), Some(new_id.as_str()));
        assert_eq!(store.get(&old_id), Some(&before));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_append_names_and_persists() {
        let memory = SharedMemory::default();
        let mut store = open(&memory);
        let id = store.current_id().unwrap().to_string();

        store.append_message(&id, Role::User, "OG Kush\nfull report").unwrap();
        store.append_message(&id, Role::Assistant, "Report").unwrap();
        store.append_message(&id, Role::User, "Now Blue Dream").unwrap();

        let conv = store.current().unwrap();
        assert_eq!(conv.title, "OG Kush");
        assert_eq!(conv.messages.len(), 3);

        let reopened = open(&memory);
        assert_eq!(reopened.get(&id).unwrap().messages, conv.messages);
    }

    #[test]
    fn test_append_exchange_adds_both() {
        let mut store = open(&SharedMemory::default());
        let id = store.current_id().unwrap().to_string();
        store
            .append_exchange(&id, ChatMessage::user("Gelato"), ChatMessage::assistant("ok"))
            .unwrap();
        let conv = store.current().unwrap();
        assert_eq!(conv.title, "Gelato");
        assert_eq!(
            conv.messages,
            vec![ChatMessage::user("Gelato"), ChatMessage::assistant("ok")]
        );
    }

    #[test]
    fn test_unknown_ids_are_reported() {
        let mut store = open(&SharedMemory::default());
        let missing = StoreError::ConversationNotFound("nope".into());
        assert_eq!(store.select("nope"), Err(missing.clone()));
        assert_eq!(store.append_message("nope", Role::User, "x"), Err(missing.clone()));
        assert_eq!(store.clear_messages("nope"), Err(missing.clone()));
        assert_eq!(store.rename("nope", "x"), Err(missing));
    }

    #[test]
    fn test_stale_selection_reports_then_repairs() {
        let mut store = open(&SharedMemory::default());
        store.current_id = Some("stale".to_string());
        assert_eq!(
            store.current(),
            Err(StoreError::ConversationNotFound("stale".into()))
        );

        store.ensure_default();
        let first = store.conversations()[0].id.clone();
        assert_eq!(store.current_id(), Some(first.as_str()));
    }

    #[test]
    fn test_clear_and_rename() {
        let memory = SharedMemory::default();
        let mut store = open(&memory);
        let id = store.current_id().unwrap().to_string();
        store.append_message(&id, Role::User, "Zkittlez").unwrap();

        store.clear_messages(&id).unwrap();
        store.rename(&id, "  Fruity strains ").unwrap();

        let reopened = open(&memory);
        let conv = reopened.get(&id).unwrap();
        assert!(conv.messages.is_empty());
        assert_eq!(conv.title, "Fruity strains");
    }

    #[test]
    fn test_select_switches_current() {
        let mut store = open(&SharedMemory::default());
        let first = store.current_id().unwrap().to_string();
        store.create_new();
        store.select(&first).unwrap();
        assert_eq!(store.current().unwrap().id, first);
    }

    #[test]
    fn test_persist_failure_keeps_runtime_state() {
        let writes = Arc::new(AtomicUsize::new(0));
        let backend = BrokenStore {
            raw: None,
            writes: writes.clone(),
        };
        let mut store = ConversationStore::open(LocalStore::new(Box::new(backend)));
        let id = store.current_id().unwrap().to_string();
        store.append_message(&id, Role::User, "Gorilla Glue").unwrap();

        assert_eq!(store.current().unwrap().messages.len(), 1);
        assert_eq!(writes.load(Ordering::SeqCst), 2);
    }
}
