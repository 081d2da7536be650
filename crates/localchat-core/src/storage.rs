//! Persistence adapter over a pluggable key-value store.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::conversation::Conversation;
use crate::error::StorageError;
use crate::settings::ChatSettings;

/// Key of the conversation list record.
pub const CONVERSATIONS_KEY: &str = "localchat-conversations";

/// Key of the settings record.
pub const SETTINGS_KEY: &str = "localchat-settings";

/// A string-keyed store of JSON text records.
///
/// Implemented by `window.localStorage` in the browser and by a directory of
/// JSON files in the terminal client.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.records.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.records
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed access to the conversations and settings records.
#[derive(Debug, Clone)]
pub struct ChatStorage<S> {
    store: S,
}

impl<S: KeyValueStore> ChatStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the conversation list. A missing record is an empty list.
    pub fn load_conversations(&self) -> Result<Vec<Conversation>, StorageError> {
        match self.store.get(CONVERSATIONS_KEY)? {
            None => Ok(Vec::new()),
            Some(text) => serde_json::from_str(&text).map_err(|source| StorageError::Corrupt {
                key: CONVERSATIONS_KEY,
                source,
            }),
        }
    }

    pub fn save_conversations(&self, conversations: &[Conversation]) -> Result<(), StorageError> {
        let text = serde_json::to_string(conversations)?;
        self.store.set(CONVERSATIONS_KEY, &text)?;
        debug!(count = conversations.len(), "Saved conversations");
        Ok(())
    }

    /// Load settings, falling back to defaults when missing or unreadable.
    pub fn load_settings(&self) -> ChatSettings {
        let text = match self.store.get(SETTINGS_KEY) {
            Ok(Some(text)) => text,
            Ok(None) => return ChatSettings::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read settings, using defaults");
                return ChatSettings::default();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(error = %e, "Stored settings are corrupt, using defaults");
            ChatSettings::default()
        })
    }

    pub fn save_settings(&self, settings: &ChatSettings) -> Result<(), StorageError> {
        let text = serde_json::to_string(settings)?;
        self.store.set(SETTINGS_KEY, &text)
    }

    /// Pretty-printed JSON of the stored conversation list.
    pub fn export_conversations(&self) -> Result<String, StorageError> {
        let conversations = self.load_conversations()?;
        Ok(serde_json::to_string_pretty(&conversations)?)
    }

    /// Replace the stored conversation list with `json`.
    ///
    /// The text is fully parsed before anything is written.
    pub fn import_conversations(&self, json: &str) -> Result<Vec<Conversation>, StorageError> {
        let conversations: Vec<Conversation> =
            serde_json::from_str(json).map_err(StorageError::InvalidFormat)?;
        self.save_conversations(&conversations)?;
        Ok(conversations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Message;
    use crate::ids::ConversationId;

    fn sample() -> Conversation {
        let mut conv = Conversation::new(ConversationId::new("1700000000000"), "llama3.2");
        conv.sync_messages(&[Message::user("Hi"), Message::assistant("Hello!")]);
        conv
    }

    #[test]
    fn test_missing_records_load_defaults() {
        let storage = ChatStorage::new(MemoryStore::new());
        assert!(storage.load_conversations().unwrap().is_empty());
        assert_eq!(storage.load_settings(), ChatSettings::default());
    }

    #[test]
    fn test_conversations_round_trip() {
        let storage = ChatStorage::new(MemoryStore::new());
        let conv = sample();
        storage.save_conversations(&[conv.clone()]).unwrap();
        let loaded = storage.load_conversations().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, conv.id);
        assert_eq!(loaded[0].messages.len(), 2);
        assert_eq!(
            loaded[0].created_at.timestamp_millis(),
            conv.created_at.timestamp_millis()
        );
    }

    #[test]
    fn test_settings_round_trip() {
        let storage = ChatStorage::new(MemoryStore::new());
        let settings = ChatSettings {
            model: "mistral".into(),
            temperature: 1.3,
            max_tokens: 512,
            system_prompt: "Be brief.".into(),
            use_knowledge_base: true,
            use_mongodb_tools: false,
        };
        storage.save_settings(&settings).unwrap();
        assert_eq!(storage.load_settings(), settings);
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let store = MemoryStore::new();
        store.set(SETTINGS_KEY, "{not json").unwrap();
        let storage = ChatStorage::new(store);
        assert_eq!(storage.load_settings(), ChatSettings::default());
    }

    #[test]
    fn test_corrupt_conversations_is_an_error() {
        let store = MemoryStore::new();
        store.set(CONVERSATIONS_KEY, "[{").unwrap();
        let storage = ChatStorage::new(store);
        assert!(matches!(
            storage.load_conversations(),
            Err(StorageError::Corrupt { key: CONVERSATIONS_KEY, .. })
        ));
    }

    #[test]
    fn test_export_then_import_restores_list() {
        let storage = ChatStorage::new(MemoryStore::new());
        storage.save_conversations(&[sample()]).unwrap();
        let exported = storage.export_conversations().unwrap();
        assert!(exported.contains("\n  "));

        let other = ChatStorage::new(MemoryStore::new());
        let imported = other.import_conversations(&exported).unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(other.load_conversations().unwrap()[0].title, "Hi");
    }

    #[test]
    fn test_invalid_import_leaves_store_untouched() {
        let storage = ChatStorage::new(MemoryStore::new());
        storage.save_conversations(&[sample()]).unwrap();
        let err = storage.import_conversations("{\"oops\": true}").unwrap_err();
        assert!(matches!(err, StorageError::InvalidFormat(_)));
        assert!(err.to_string().starts_with("Invalid JSON format"));
        assert_eq!(storage.load_conversations().unwrap().len(), 1);
    }
}
