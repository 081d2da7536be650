//! Conversation manager: the application state shared by every front end.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::chat::Message;
use crate::conversation::Conversation;
use crate::error::{SessionError, StorageError};
use crate::ids::ConversationId;
use crate::model::ChatResponse;
use crate::session::{ChatSession, SendMode, SendTicket};
use crate::settings::ChatSettings;
use crate::storage::{ChatStorage, KeyValueStore};

/// Owns the conversation list, the current selection, settings, and the
/// chat session.
///
/// Every transition that changes the transcript writes the current
/// conversation back into the list and persists the whole list. Storage
/// failures never abort a transition; the most recent one is kept for the
/// front end to report (see [`ConversationManager::take_storage_error`]).
#[derive(Debug)]
pub struct ConversationManager<S> {
    storage: ChatStorage<S>,
    conversations: Vec<Conversation>,
    current_id: Option<ConversationId>,
    settings: ChatSettings,
    session: ChatSession,
    synced_revision: u64,
    storage_error: Option<StorageError>,
}

impl<S: KeyValueStore> ConversationManager<S> {
    /// Load persisted state and select the first conversation, if any.
    pub fn load(store: S) -> Result<Self, StorageError> {
        let storage = ChatStorage::new(store);
        let conversations = storage.load_conversations()?;
        let settings = storage.load_settings();
        info!(
            conversations = conversations.len(),
            model = %settings.model,
            "Loaded chat state"
        );

        let mut manager = Self {
            storage,
            conversations,
            current_id: None,
            settings,
            session: ChatSession::new(),
            synced_revision: 0,
            storage_error: None,
        };
        manager.select_first();
        Ok(manager)
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn current_id(&self) -> Option<&ConversationId> {
        self.current_id.as_ref()
    }

    pub fn current_conversation(&self) -> Option<&Conversation> {
        let id = self.current_id.as_ref()?;
        self.conversations.iter().find(|c| &c.id == id)
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn messages(&self) -> &[Message] {
        self.session.messages()
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    pub fn is_streaming(&self) -> bool {
        self.session.is_streaming()
    }

    /// The most recent persistence failure, if any, clearing it.
    pub fn take_storage_error(&mut self) -> Option<StorageError> {
        self.storage_error.take()
    }

    /// Create an empty conversation at the top of the list and select it.
    pub fn new_conversation(&mut self) -> ConversationId {
        self.sync_current();

        let id = self.unique_id();
        let conversation = Conversation::new(id.clone(), self.settings.model.clone());
        self.conversations.insert(0, conversation);
        self.save_list();

        self.current_id = Some(id.clone());
        self.session.clear_messages();
        self.mark_synced();
        info!(conversation_id = %id, "Created conversation");
        id
    }

    /// Switch to conversation `id`. Returns false if it does not exist.
    pub fn select_conversation(&mut self, id: &ConversationId) -> bool {
        if self.current_id.as_ref() == Some(id) {
            return true;
        }
        self.sync_current();

        let Some(conversation) = self.conversations.iter().find(|c| &c.id == id) else {
            debug!(conversation_id = %id, "Select ignored, conversation not found");
            return false;
        };
        let messages = conversation.messages.clone();
        self.current_id = Some(id.clone());
        self.session.set_messages(messages);
        self.mark_synced();
        true
    }

    /// Remove conversation `id`. Returns false if it does not exist.
    pub fn delete_conversation(&mut self, id: &ConversationId) -> bool {
        self.sync_current();

        let Some(index) = self.conversations.iter().position(|c| &c.id == id) else {
            return false;
        };
        self.conversations.remove(index);
        self.save_list();
        info!(conversation_id = %id, "Deleted conversation");

        if self.current_id.as_ref() == Some(id) {
            self.select_first();
        }
        true
    }

    /// Send `content`, creating a conversation first if none is selected.
    pub fn send_message(&mut self, content: &str, mode: SendMode) -> Result<SendTicket, SessionError> {
        if self.session.is_loading() {
            return Err(SessionError::Busy);
        }
        if content.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.current_id.is_none() {
            self.new_conversation();
        }
        let ticket = self.session.send_message(content, &self.settings, mode)?;
        self.sync_current();
        Ok(ticket)
    }

    pub fn apply_fragment(&mut self, request_id: u64, fragment: &str) -> bool {
        let applied = self.session.apply_fragment(request_id, fragment);
        if applied {
            self.sync_current();
        }
        applied
    }

    pub fn finish_stream(&mut self, request_id: u64) -> bool {
        let finished = self.session.finish_stream(request_id);
        self.sync_current();
        finished
    }

    pub fn complete(&mut self, request_id: u64, response: ChatResponse) -> bool {
        let completed = self.session.complete(request_id, response);
        self.sync_current();
        completed
    }

    pub fn fail(&mut self, request_id: u64, error: &str) -> bool {
        let failed = self.session.fail(request_id, error);
        if failed {
            warn!(request_id, error, "Chat request failed");
        }
        self.sync_current();
        failed
    }

    pub fn stop_generation(&mut self) {
        self.session.stop_generation();
    }

    pub fn regenerate_last_message(&mut self, mode: SendMode) -> Result<Option<SendTicket>, SessionError> {
        let ticket = self.session.regenerate_last_message(&self.settings, mode)?;
        self.sync_current();
        Ok(ticket)
    }

    /// Empty the on-screen transcript without touching the stored copy.
    pub fn clear_messages(&mut self) {
        self.session.clear_messages();
        self.mark_synced();
    }

    /// Apply `update` to the settings and persist them if anything changed.
    pub fn update_settings(&mut self, update: impl FnOnce(&mut ChatSettings)) -> bool {
        let mut next = self.settings.clone();
        update(&mut next);
        if next == self.settings {
            return false;
        }
        self.settings = next;
        if let Err(e) = self.storage.save_settings(&self.settings) {
            warn!(error = %e, "Failed to save settings");
            self.storage_error = Some(e);
        }
        true
    }

    /// Pretty-printed JSON of all conversations.
    pub fn export_conversations(&mut self) -> Result<String, StorageError> {
        self.sync_current();
        self.storage.export_conversations()
    }

    /// Replace every conversation with the contents of `json`.
    ///
    /// Nothing changes if `json` is not a valid conversation list.
    pub fn import_conversations(&mut self, json: &str) -> Result<usize, StorageError> {
        let conversations = self.storage.import_conversations(json)?;
        let count = conversations.len();
        self.conversations = conversations;
        self.current_id = None;
        self.select_first();
        info!(count, "Imported conversations");
        Ok(count)
    }

    fn select_first(&mut self) {
        match self.conversations.first() {
            Some(first) => {
                let messages = first.messages.clone();
                self.current_id = Some(first.id.clone());
                self.session.set_messages(messages);
            }
            None => {
                self.current_id = None;
                self.session.clear_messages();
            }
        }
        self.mark_synced();
    }

    fn unique_id(&self) -> ConversationId {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = ConversationId::from_millis(millis);
            if !self.conversations.iter().any(|c| c.id == id) {
                return id;
            }
            millis += 1;
        }
    }

    fn mark_synced(&mut self) {
        self.synced_revision = self.session.revision();
    }

    /// Write the transcript back into the current conversation and persist.
    fn sync_current(&mut self) {
        let revision = self.session.revision();
        if revision == self.synced_revision {
            return;
        }
        self.synced_revision = revision;

        let messages = self.session.messages();
        if messages.is_empty() {
            return;
        }
        let Some(id) = self.current_id.as_ref() else {
            return;
        };
        let Some(conversation) = self.conversations.iter_mut().find(|c| &c.id == id) else {
            return;
        };
        conversation.sync_messages(messages);
        self.save_list();
    }

    fn save_list(&mut self) {
        if let Err(e) = self.storage.save_conversations(&self.conversations) {
            warn!(error = %e, "Failed to save conversations");
            self.storage_error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;
    use crate::storage::{MemoryStore, CONVERSATIONS_KEY};

    fn manager() -> (ConversationManager<MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        let manager = ConversationManager::load(store.clone()).unwrap();
        (manager, store)
    }

    fn stored(store: &MemoryStore) -> Vec<Conversation> {
        ChatStorage::new(store.clone()).load_conversations().unwrap()
    }

    fn exchange(manager: &mut ConversationManager<MemoryStore>, prompt: &str, reply: &str) {
        let ticket = manager.send_message(prompt, SendMode::Streaming).unwrap();
        manager.apply_fragment(ticket.id, reply);
        manager.finish_stream(ticket.id);
    }

    #[test]
    fn test_load_selects_first_conversation() {
        let store = MemoryStore::new();
        let storage = ChatStorage::new(store.clone());
        let mut newer = Conversation::new(ConversationId::new("2"), "m");
        newer.sync_messages(&[Message::user("newer")]);
        let older = Conversation::new(ConversationId::new("1"), "m");
        storage.save_conversations(&[newer, older]).unwrap();

        let manager = ConversationManager::load(store).unwrap();
        assert_eq!(manager.current_id().unwrap().as_str(), "2");
        assert_eq!(manager.messages()[0].content, "newer");
    }

    #[test]
    fn test_load_fails_on_corrupt_conversations() {
        let store = MemoryStore::new();
        store.set(CONVERSATIONS_KEY, "nope").unwrap();
        assert!(ConversationManager::load(store).is_err());
    }

    #[test]
    fn test_send_without_selection_creates_conversation() {
        let (mut manager, store) = manager();
        assert!(manager.current_id().is_none());

        exchange(&mut manager, "Explain quicksort in detail please", "Sure");

        let saved = stored(&store);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].title, "Explain quicksort in detail please");
        assert_eq!(saved[0].messages.len(), 2);
        assert_eq!(saved[0].messages[1].content, "Sure");
    }

    #[test]
    fn test_every_fragment_is_persisted() {
        let (mut manager, store) = manager();
        let ticket = manager.send_message("Hi", SendMode::Streaming).unwrap();
        manager.apply_fragment(ticket.id, "Hel");
        assert_eq!(stored(&store)[0].messages[1].content, "Hel");
        manager.apply_fragment(ticket.id, "lo");
        assert_eq!(stored(&store)[0].messages[1].content, "Hello");
    }

    #[test]
    fn test_new_conversation_persists_previous_first() {
        let (mut manager, store) = manager();
        exchange(&mut manager, "First topic", "ok");
        let first_id = manager.current_id().cloned().unwrap();

        let new_id = manager.new_conversation();
        assert_ne!(new_id, first_id);
        assert!(manager.messages().is_empty());

        let saved = stored(&store);
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].id, new_id);
        assert_eq!(saved[0].title, crate::DEFAULT_TITLE);
        assert_eq!(saved[1].id, first_id);
        assert_eq!(saved[1].title, "First topic");
    }

    #[test]
    fn test_new_conversation_ids_are_unique() {
        let (mut manager, _) = manager();
        let a = manager.new_conversation();
        let b = manager.new_conversation();
        let c = manager.new_conversation();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn test_select_hydrates_transcript() {
        let (mut manager, _) = manager();
        exchange(&mut manager, "one", "1");
        let first = manager.current_id().cloned().unwrap();
        manager.new_conversation();
        exchange(&mut manager, "two", "2");

        assert!(manager.select_conversation(&first));
        assert_eq!(manager.messages()[0].content, "one");
        assert!(!manager.select_conversation(&ConversationId::new("missing")));
        assert_eq!(manager.current_id(), Some(&first));
    }

    #[test]
    fn test_select_does_not_restamp_target() {
        let (mut manager, store) = manager();
        exchange(&mut manager, "one", "1");
        let first = manager.current_id().cloned().unwrap();
        let stamped = stored(&store)[0].updated_at;
        manager.new_conversation();
        manager.select_conversation(&first);
        let saved = stored(&store);
        let target = saved.iter().find(|c| c.id == first).unwrap();
        assert_eq!(target.updated_at, stamped);
    }

    #[test]
    fn test_delete_only_current_clears_selection() {
        let (mut manager, store) = manager();
        exchange(&mut manager, "hi", "there");
        let id = manager.current_id().cloned().unwrap();

        assert!(manager.delete_conversation(&id));
        assert!(manager.current_id().is_none());
        assert!(manager.messages().is_empty());
        assert!(stored(&store).is_empty());
    }

    #[test]
    fn test_delete_current_selects_new_first() {
        let (mut manager, _) = manager();
        exchange(&mut manager, "older", "a");
        let older = manager.current_id().cloned().unwrap();
        manager.new_conversation();
        exchange(&mut manager, "newer", "b");
        let newer = manager.current_id().cloned().unwrap();

        manager.delete_conversation(&newer);
        assert_eq!(manager.current_id(), Some(&older));
        assert_eq!(manager.messages()[0].content, "older");
    }

    #[test]
    fn test_delete_other_leaves_current_untouched() {
        let (mut manager, _) = manager();
        exchange(&mut manager, "older", "a");
        let older = manager.current_id().cloned().unwrap();
        manager.new_conversation();
        exchange(&mut manager, "newer", "b");
        let newer = manager.current_id().cloned().unwrap();

        assert!(manager.delete_conversation(&older));
        assert_eq!(manager.current_id(), Some(&newer));
        assert_eq!(manager.messages().len(), 2);
        assert_eq!(manager.conversations().len(), 1);
    }

    #[test]
    fn test_clear_does_not_touch_storage() {
        let (mut manager, store) = manager();
        exchange(&mut manager, "keep me", "ok");
        manager.clear_messages();
        assert!(manager.messages().is_empty());
        assert_eq!(stored(&store)[0].messages.len(), 2);
    }

    #[test]
    fn test_failure_is_persisted() {
        let (mut manager, store) = manager();
        let ticket = manager.send_message("Hi", SendMode::Blocking).unwrap();
        manager.fail(ticket.id, "Failed to send message: HTTP 503");
        let saved = stored(&store);
        assert_eq!(saved[0].messages[1].role, Role::Assistant);
        assert_eq!(saved[0].messages[1].content, "Error: Failed to send message: HTTP 503");
        assert!(!manager.is_loading());
    }

    #[test]
    fn test_update_settings_persists_changes_only() {
        let (mut manager, store) = manager();
        assert!(!manager.update_settings(|_| {}));
        assert!(manager.update_settings(|s| s.model = "mistral".into()));

        let reloaded = ConversationManager::load(store).unwrap();
        assert_eq!(reloaded.settings().model, "mistral");
    }

    #[test]
    fn test_new_conversation_uses_current_model() {
        let (mut manager, _) = manager();
        manager.update_settings(|s| s.model = "phi3:mini".into());
        manager.new_conversation();
        assert_eq!(manager.current_conversation().unwrap().model, "phi3:mini");
    }

    #[test]
    fn test_import_replaces_list_and_reselects() {
        let (mut manager, _) = manager();
        exchange(&mut manager, "source", "data");
        let exported = manager.export_conversations().unwrap();

        let (mut other, _) = self::manager();
        exchange(&mut other, "to be replaced", "x");
        assert_eq!(other.import_conversations(&exported).unwrap(), 1);
        assert_eq!(other.conversations()[0].title, "source");
        assert_eq!(other.messages()[0].content, "source");
    }

    #[test]
    fn test_invalid_import_changes_nothing() {
        let (mut manager, store) = manager();
        exchange(&mut manager, "keep", "me");
        assert!(matches!(
            manager.import_conversations("not json"),
            Err(StorageError::InvalidFormat(_))
        ));
        assert_eq!(manager.conversations().len(), 1);
        assert_eq!(stored(&store)[0].title, "keep");
    }

    #[test]
    fn test_regenerate_persists_truncated_history() {
        let (mut manager, store) = manager();
        exchange(&mut manager, "A", "B");
        let ticket = manager
            .regenerate_last_message(SendMode::Streaming)
            .unwrap()
            .unwrap();
        manager.apply_fragment(ticket.id, "C");
        manager.finish_stream(ticket.id);

        let saved = stored(&store);
        let contents: Vec<_> = saved[0].messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["A", "C"]);
    }
}
