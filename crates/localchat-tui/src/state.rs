//! UI-only state: focus, popups, scroll, and transient messages.
//!
//! Conversation and session data live in the `ConversationManager`; this is
//! everything the terminal needs on top of it.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use localchat_core::{ConversationId, ModelInfo};
use localchat_ui::{InputBuffer, MessageListState, SettingsField, StatusLevel};

use crate::event::BackendStatus;

/// How long the "Copied!" acknowledgement stays on a code block.
pub const COPIED_ACK: Duration = Duration::from_secs(2);

/// Available views in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Chat,
    KnowledgeBase,
}

impl View {
    pub const TITLES: [&'static str; 2] = ["Chat", "Knowledge Base"];

    pub fn index(self) -> usize {
        match self {
            View::Chat => 0,
            View::KnowledgeBase => 1,
        }
    }
}

/// Which pane receives keys in the chat view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Messages,
    Sidebar,
}

impl Focus {
    /// Next pane in Tab order, skipping the sidebar while it is hidden.
    pub fn next(self, sidebar_visible: bool) -> Self {
        match self {
            Focus::Input => Focus::Messages,
            Focus::Messages if sidebar_visible => Focus::Sidebar,
            Focus::Messages | Focus::Sidebar => Focus::Input,
        }
    }
}

/// Modal overlays; at most one is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    Settings,
    EditSystemPrompt,
    ConfirmDelete(ConversationId),
    IngestPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Uploading,
    Done(String),
    Failed(String),
}

/// One document sent from the knowledge base view.
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub path: PathBuf,
    pub status: UploadStatus,
}

/// Footer status line.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
}

#[derive(Debug)]
pub struct UiState {
    pub view: View,
    pub focus: Focus,
    pub popup: Option<Popup>,
    pub show_sidebar: bool,

    /// Message being composed.
    pub input: InputBuffer,
    /// Text of the open input dialog.
    pub dialog_input: InputBuffer,

    pub message_list: MessageListState,
    pub sidebar_cursor: usize,
    pub settings_field: SettingsField,

    /// Models offered in the settings panel.
    pub models: Vec<ModelInfo>,
    /// `models` is the built-in fallback list.
    pub models_fallback: bool,

    pub backend: BackendStatus,
    pub status: Option<StatusMessage>,
    /// When the current "Copied!" acknowledgement started.
    pub copied_at: Option<Instant>,
    pub uploads: Vec<UploadRecord>,
    pub should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            view: View::default(),
            focus: Focus::default(),
            popup: None,
            show_sidebar: true,
            input: InputBuffer::new(),
            dialog_input: InputBuffer::new(),
            message_list: MessageListState::default(),
            sidebar_cursor: 0,
            settings_field: SettingsField::Model,
            models: ModelInfo::fallback_list(),
            models_fallback: true,
            backend: BackendStatus::default(),
            status: None,
            copied_at: None,
            uploads: Vec::new(),
            should_quit: false,
        }
    }
}

impl UiState {
    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.set_status(text, StatusLevel::Info);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.set_status(text, StatusLevel::Error);
    }

    pub fn mark_copied(&mut self, now: Instant) {
        self.message_list.copied = true;
        self.copied_at = Some(now);
    }

    /// Drop the "Copied!" acknowledgement once it has been shown long enough.
    pub fn expire_copied(&mut self, now: Instant) {
        if let Some(at) = self.copied_at {
            if now.duration_since(at) >= COPIED_ACK {
                self.copied_at = None;
                self.message_list.copied = false;
            }
        }
    }

    /// Keep the sidebar cursor inside a list of `len` rows.
    pub fn clamp_sidebar_cursor(&mut self, len: usize) {
        self.sidebar_cursor = self.sidebar_cursor.min(len.saturating_sub(1));
    }

    /// Forget scroll and code selection after the transcript is replaced.
    pub fn reset_transcript_view(&mut self) {
        self.message_list.reset();
        self.copied_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_cycle() {
        assert_eq!(Focus::Input.next(true), Focus::Messages);
        assert_eq!(Focus::Messages.next(true), Focus::Sidebar);
        assert_eq!(Focus::Sidebar.next(true), Focus::Input);
        assert_eq!(Focus::Messages.next(false), Focus::Input);
    }

    #[test]
    fn test_copied_ack_expires_after_two_seconds() {
        let mut state = UiState::default();
        let start = Instant::now();
        state.mark_copied(start);
        assert!(state.message_list.copied);

        state.expire_copied(start + Duration::from_millis(1999));
        assert!(state.message_list.copied);

        state.expire_copied(start + COPIED_ACK);
        assert!(!state.message_list.copied);
        assert!(state.copied_at.is_none());
    }

    #[test]
    fn test_defaults_use_fallback_models() {
        let state = UiState::default();
        assert!(state.models_fallback);
        let names: Vec<&str> = state.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["llama3.2", "mistral", "phi3:mini"]);
    }

    #[test]
    fn test_clamp_sidebar_cursor() {
        let mut state = UiState {
            sidebar_cursor: 5,
            ..UiState::default()
        };
        state.clamp_sidebar_cursor(3);
        assert_eq!(state.sidebar_cursor, 2);
        state.clamp_sidebar_cursor(0);
        assert_eq!(state.sidebar_cursor, 0);
    }
}
