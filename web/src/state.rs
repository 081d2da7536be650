//! Reactive wrapper around the conversation manager.
//!
//! The manager itself is plain Rust; a [`Trigger`] tells Leptos when it
//! changed so views re-read it.

use leptos::*;

use localchat_core::{
    ChatSettings, Conversation, ConversationId, ConversationManager, Message, ModelInfo,
    SendMode, SendTicket, SessionError, StorageError,
};

use crate::api;
use crate::storage::LocalStore;

/// Shared app state, provided as context at the root.
#[derive(Clone, Copy)]
pub struct ChatState {
    manager: StoredValue<ConversationManager<LocalStore>>,
    changed: Trigger,
    pub models: RwSignal<Vec<ModelInfo>>,
    /// True while `models` holds the built-in list.
    pub models_fallback: RwSignal<bool>,
    /// Last error worth showing above the input.
    pub notice: RwSignal<Option<String>>,
    /// Streaming or blocking replies; not persisted.
    pub mode: RwSignal<SendMode>,
}

impl ChatState {
    pub fn load() -> Result<Self, StorageError> {
        let manager = ConversationManager::load(LocalStore)?;
        Ok(Self {
            manager: store_value(manager),
            changed: create_trigger(),
            models: create_rw_signal(ModelInfo::fallback_list()),
            models_fallback: create_rw_signal(true),
            notice: create_rw_signal(None),
            mode: create_rw_signal(SendMode::Streaming),
        })
    }

    /// Read the manager and subscribe the calling scope to its changes.
    fn read<R>(&self, f: impl FnOnce(&ConversationManager<LocalStore>) -> R) -> R {
        self.changed.track();
        self.manager.with_value(f)
    }

    /// Change the manager, surface any save failure, then notify readers.
    fn mutate<R>(&self, f: impl FnOnce(&mut ConversationManager<LocalStore>) -> R) -> Option<R> {
        let (result, storage_error) = self.manager.try_update_value(|manager| {
            let result = f(manager);
            (result, manager.take_storage_error())
        })?;
        if let Some(e) = storage_error {
            self.notice.set(Some(format!("Could not save: {}", e)));
        }
        self.changed.notify();
        Some(result)
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.read(|m| m.conversations().to_vec())
    }

    pub fn current_id(&self) -> Option<ConversationId> {
        self.read(|m| m.current_id().cloned())
    }

    pub fn current_title(&self) -> Option<String> {
        self.read(|m| m.current_conversation().map(|c| c.title.clone()))
    }

    pub fn messages(&self) -> Vec<Message> {
        self.read(|m| m.messages().to_vec())
    }

    pub fn is_loading(&self) -> bool {
        self.read(|m| m.is_loading())
    }

    pub fn is_streaming(&self) -> bool {
        self.read(|m| m.is_streaming())
    }

    pub fn settings(&self) -> ChatSettings {
        self.read(|m| m.settings().clone())
    }

    pub fn new_conversation(&self) {
        self.mutate(|m| m.new_conversation());
    }

    pub fn select(&self, id: &ConversationId) {
        self.mutate(|m| m.select_conversation(id));
    }

    pub fn delete(&self, id: &ConversationId) {
        self.mutate(|m| m.delete_conversation(id));
    }

    /// Send `content`. Returns false when nothing was sent.
    pub fn send(&self, content: &str) -> bool {
        let mode = self.mode.get_untracked();
        match self.mutate(|m| m.send_message(content, mode)) {
            Some(Ok(ticket)) => {
                self.notice.set(None);
                self.run(ticket);
                true
            }
            Some(Err(SessionError::Busy)) | Some(Err(SessionError::EmptyMessage)) | None => false,
        }
    }

    pub fn stop(&self) {
        self.mutate(|m| m.stop_generation());
    }

    pub fn regenerate(&self) {
        let mode = self.mode.get_untracked();
        if let Some(Ok(Some(ticket))) = self.mutate(|m| m.regenerate_last_message(mode)) {
            self.notice.set(None);
            self.run(ticket);
        }
    }

    pub fn clear(&self) {
        self.mutate(|m| m.clear_messages());
    }

    pub fn update_settings(&self, update: impl FnOnce(&mut ChatSettings)) {
        self.mutate(|m| m.update_settings(update));
    }

    pub fn export_json(&self) -> Result<String, String> {
        match self.mutate(|m| m.export_conversations()) {
            Some(result) => result.map_err(|e| e.to_string()),
            None => Err("App state is gone".to_string()),
        }
    }

    pub fn import_json(&self, json: &str) -> Result<usize, String> {
        match self.mutate(|m| m.import_conversations(json)) {
            Some(result) => result.map_err(|e| e.to_string()),
            None => Err("App state is gone".to_string()),
        }
    }

    /// Fetch the model list, keeping the built-in list on failure.
    pub fn load_models(&self) {
        let state = *self;
        spawn_local(async move {
            match api::fetch_models().await {
                Ok(models) if !models.is_empty() => {
                    state.models.set(models);
                    state.models_fallback.set(false);
                }
                Ok(_) => {
                    state.models.set(ModelInfo::fallback_list());
                    state.models_fallback.set(true);
                }
                Err(e) => {
                    web_sys::console::warn_1(&format!("Failed to fetch models: {}", e).into());
                    state.models.set(ModelInfo::fallback_list());
                    state.models_fallback.set(true);
                }
            }
        });
    }

    /// Perform a ticket's request and report the outcome to the manager.
    fn run(&self, ticket: SendTicket) {
        let state = *self;
        spawn_local(async move {
            let SendTicket {
                id,
                request,
                mode,
                cancel,
            } = ticket;

            match mode {
                SendMode::Streaming => {
                    let result = api::stream_chat(&request, &cancel, |fragment| {
                        state.mutate(|m| m.apply_fragment(id, &fragment));
                    })
                    .await;
                    if cancel.is_cancelled() {
                        return;
                    }
                    match result {
                        Ok(()) => state.mutate(|m| m.finish_stream(id)),
                        Err(e) => state.mutate(|m| m.fail(id, &e)),
                    };
                }
                SendMode::Blocking => {
                    let result = api::send_chat(&request).await;
                    if cancel.is_cancelled() {
                        return;
                    }
                    match result {
                        Ok(response) => state.mutate(|m| m.complete(id, response)),
                        Err(e) => state.mutate(|m| m.fail(id, &e)),
                    };
                }
            }
        });
    }
}
