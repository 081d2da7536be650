//! Application state and main event loop.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use localchat_core::markdown;
use localchat_core::{ConversationManager, KeyValueStore, ModelInfo, SendMode, SendTicket};
use localchat_ui::{SettingsField, StatusLevel, Theme};

use crate::clipboard::Clipboard;
use crate::event::{BackendCommand, UiEvent};
use crate::render;
use crate::state::{Focus, Popup, UiState, UploadRecord, UploadStatus, View};

/// How long to wait for terminal input when nothing else is pending.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Lines moved by PageUp/PageDown.
const PAGE_SCROLL: usize = 10;

/// Result of a key press inside a text dialog.
enum DialogAction {
    Submit(String),
    Cancel,
    Edited,
}

/// Main application: conversation state, UI state, and channel handles.
pub struct App<S> {
    manager: ConversationManager<S>,
    state: UiState,
    theme: Theme,
    mode: SendMode,
    clipboard: Clipboard,

    /// Receiver for events from the backend.
    ui_rx: mpsc::Receiver<UiEvent>,

    /// Sender for commands to the backend.
    cmd_tx: mpsc::Sender<BackendCommand>,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(
        manager: ConversationManager<S>,
        mode: SendMode,
        ui_rx: mpsc::Receiver<UiEvent>,
        cmd_tx: mpsc::Sender<BackendCommand>,
    ) -> Self {
        let mut app = Self {
            manager,
            state: UiState::default(),
            theme: Theme::default(),
            mode,
            clipboard: Clipboard::default(),
            ui_rx,
            cmd_tx,
        };
        app.sync_sidebar_cursor();
        app
    }

    /// Run the main event loop.
    ///
    /// Backend events are applied one per frame, so every streamed fragment
    /// is drawn; the input poll does not wait while events are queued.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> std::io::Result<()> {
        self.send_command(BackendCommand::LoadModels);

        let mut backlog = false;
        loop {
            terminal.draw(|frame| render::render(frame, &mut self.state, &self.manager, &self.theme))?;

            let timeout = if backlog { Duration::ZERO } else { POLL_INTERVAL };
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Paste(text) => self.handle_paste(&text),
                    _ => {}
                }
            }

            backlog = match self.ui_rx.try_recv() {
                Ok(event) => {
                    self.apply_event(event);
                    true
                }
                Err(_) => false,
            };

            self.state.expire_copied(Instant::now());
            if self.state.should_quit {
                break;
            }
        }

        self.manager.stop_generation();
        let _ = self.cmd_tx.blocking_send(BackendCommand::Quit);

        Ok(())
    }

    /// Apply an event from the backend.
    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Fragment { request_id, text } => {
                self.manager.apply_fragment(request_id, &text);
            }
            UiEvent::StreamFinished { request_id } => {
                self.manager.finish_stream(request_id);
            }
            UiEvent::Completed {
                request_id,
                response,
            } => {
                self.manager.complete(request_id, response);
            }
            UiEvent::RequestFailed { request_id, error } => {
                if self.manager.fail(request_id, &error) {
                    self.state.error(error);
                }
            }
            UiEvent::ModelsLoaded(models) if !models.is_empty() => {
                debug!(count = models.len(), "Models loaded");
                self.state.models = models;
                self.state.models_fallback = false;
            }
            UiEvent::ModelsLoaded(_) => {
                self.use_fallback_models("no models installed");
            }
            UiEvent::ModelsFailed(error) => {
                self.use_fallback_models(&error);
            }
            UiEvent::HealthChanged(status) => {
                self.state.backend = status;
            }
            UiEvent::DocumentIngested { path, receipt } => {
                let summary = receipt.to_string();
                self.state
                    .set_status(format!("{}: {}", file_label(&path), summary), StatusLevel::Success);
                self.set_upload_status(&path, UploadStatus::Done(summary));
            }
            UiEvent::IngestFailed { path, error } => {
                self.state
                    .error(format!("{}: {}", file_label(&path), error));
                self.set_upload_status(&path, UploadStatus::Failed(error));
            }
        }
        self.report_storage_error();
    }

    fn use_fallback_models(&mut self, reason: &str) {
        warn!(reason, "Using fallback model list");
        self.state.models = ModelInfo::fallback_list();
        self.state.models_fallback = true;
    }

    fn set_upload_status(&mut self, path: &Path, status: UploadStatus) {
        if let Some(record) = self
            .state
            .uploads
            .iter_mut()
            .rev()
            .find(|r| r.path == path && r.status == UploadStatus::Uploading)
        {
            record.status = status;
        }
    }

    // ---- keys ----

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            self.state.should_quit = true;
            return;
        }

        if let Some(popup) = self.state.popup.clone() {
            self.handle_popup_key(popup, key);
            return;
        }

        match key.code {
            KeyCode::F(1) => {
                self.state.view = View::Chat;
                return;
            }
            KeyCode::F(2) => {
                self.state.view = View::KnowledgeBase;
                return;
            }
            _ => {}
        }

        if ctrl {
            match key.code {
                KeyCode::Char('n') => self.new_conversation(),
                KeyCode::Char('r') => self.regenerate(),
                KeyCode::Char('l') => self.clear_messages(),
                KeyCode::Char('o') => self.state.popup = Some(Popup::Settings),
                KeyCode::Char('b') => self.toggle_sidebar(),
                _ => {}
            }
            return;
        }

        match self.state.view {
            View::Chat => self.handle_chat_key(key),
            View::KnowledgeBase => self.handle_knowledge_key(key),
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                if self.manager.is_loading() {
                    self.stop_generation();
                } else {
                    self.state.focus = Focus::Input;
                }
            }
            KeyCode::Tab => self.state.focus = self.state.focus.next(self.state.show_sidebar),
            KeyCode::PageUp => self.state.message_list.scroll_up(PAGE_SCROLL),
            KeyCode::PageDown => self.state.message_list.scroll_down(PAGE_SCROLL),
            _ => match self.state.focus {
                Focus::Input => self.handle_input_key(key),
                Focus::Messages => self.handle_messages_key(key),
                Focus::Sidebar => self.handle_sidebar_key(key),
            },
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let input = &mut self.state.input;
        match key.code {
            KeyCode::Enter if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
                input.insert_newline();
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Char(c) => input.insert(c),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Delete => input.delete(),
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Home => input.move_home(),
            KeyCode::End => input.move_end(),
            KeyCode::Up => self.state.message_list.scroll_up(1),
            KeyCode::Down => self.state.message_list.scroll_down(1),
            _ => {}
        }
    }

    fn handle_messages_key(&mut self, key: KeyEvent) {
        let list = &mut self.state.message_list;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => list.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => list.scroll_down(1),
            KeyCode::Home | KeyCode::Char('g') => list.scroll_up(usize::MAX),
            KeyCode::End | KeyCode::Char('G') => list.follow(),
            KeyCode::Char('n') => list.select_next_code(),
            KeyCode::Char('p') => list.select_prev_code(),
            KeyCode::Char('y') | KeyCode::Enter => self.copy_selected_code(),
            _ => {}
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        let count = self.manager.conversations().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.sidebar_cursor = self.state.sidebar_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.state.sidebar_cursor + 1 < count {
                    self.state.sidebar_cursor += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(conversation) = self.manager.conversations().get(self.state.sidebar_cursor) {
                    let id = conversation.id.clone();
                    self.manager.select_conversation(&id);
                    self.state.reset_transcript_view();
                    self.state.focus = Focus::Input;
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(conversation) = self.manager.conversations().get(self.state.sidebar_cursor) {
                    self.state.popup = Some(Popup::ConfirmDelete(conversation.id.clone()));
                }
            }
            KeyCode::Char('n') => self.new_conversation(),
            _ => {}
        }
        self.report_storage_error();
    }

    fn handle_knowledge_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('u') | KeyCode::Enter => {
                self.state.dialog_input.clear();
                self.state.popup = Some(Popup::IngestPath);
            }
            KeyCode::Esc if self.manager.is_loading() => self.stop_generation(),
            _ => {}
        }
    }

    fn handle_popup_key(&mut self, popup: Popup, key: KeyEvent) {
        match popup {
            Popup::Settings => self.handle_settings_key(key),
            Popup::EditSystemPrompt => match self.handle_dialog_key(key) {
                DialogAction::Submit(prompt) => {
                    self.manager.update_settings(|s| s.system_prompt = prompt);
                    self.state.popup = Some(Popup::Settings);
                }
                DialogAction::Cancel => self.state.popup = Some(Popup::Settings),
                DialogAction::Edited => {}
            },
            Popup::IngestPath => match self.handle_dialog_key(key) {
                DialogAction::Submit(path) => {
                    self.state.popup = None;
                    let path = path.trim();
                    if !path.is_empty() {
                        self.upload(PathBuf::from(path));
                    }
                }
                DialogAction::Cancel => self.state.popup = None,
                DialogAction::Edited => {}
            },
            Popup::ConfirmDelete(id) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    self.state.popup = None;
                    if self.manager.delete_conversation(&id) {
                        self.state.reset_transcript_view();
                        self.sync_sidebar_cursor();
                        self.state.info("Conversation deleted");
                    }
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.state.popup = None,
                _ => {}
            },
        }
        self.report_storage_error();
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let field = self.state.settings_field;
        match key.code {
            KeyCode::Esc => self.state.popup = None,
            KeyCode::Char('o') if ctrl => self.state.popup = None,
            KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => {
                self.state.settings_field = field.prev();
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.state.settings_field = field.next();
            }
            KeyCode::Left | KeyCode::Char('h') => self.adjust_setting(field, -1),
            KeyCode::Right | KeyCode::Char('l') => self.adjust_setting(field, 1),
            KeyCode::Enter | KeyCode::Char(' ') => match field {
                SettingsField::SystemPrompt => {
                    let prompt = self.manager.settings().system_prompt.clone();
                    self.state.dialog_input.set_text(prompt);
                    self.state.popup = Some(Popup::EditSystemPrompt);
                }
                _ => self.adjust_setting(field, 1),
            },
            _ => {}
        }
    }

    fn adjust_setting(&mut self, field: SettingsField, steps: i32) {
        match field {
            SettingsField::Model => {
                let models = &self.state.models;
                if models.is_empty() {
                    return;
                }
                let len = models.len() as i32;
                let current = models
                    .iter()
                    .position(|m| m.name == self.manager.settings().model)
                    .map(|i| i as i32);
                let next = match current {
                    Some(i) => (i + steps).rem_euclid(len),
                    None => 0,
                };
                let name = models[next as usize].name.clone();
                self.manager.update_settings(|s| s.model = name);
            }
            SettingsField::Temperature => {
                self.manager.update_settings(|s| s.step_temperature(steps));
            }
            SettingsField::MaxTokens => {
                self.manager.update_settings(|s| s.step_max_tokens(steps));
            }
            SettingsField::SystemPrompt => {}
            SettingsField::KnowledgeBase => {
                self.manager
                    .update_settings(|s| s.use_knowledge_base = !s.use_knowledge_base);
            }
            SettingsField::MongoTools => {
                self.manager
                    .update_settings(|s| s.use_mongodb_tools = !s.use_mongodb_tools);
            }
        }
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) -> DialogAction {
        let input = &mut self.state.dialog_input;
        match key.code {
            KeyCode::Esc => return DialogAction::Cancel,
            KeyCode::Enter if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
                input.insert_newline();
            }
            KeyCode::Enter => return DialogAction::Submit(input.take()),
            KeyCode::Char(c) => input.insert(c),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Delete => input.delete(),
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Home => input.move_home(),
            KeyCode::End => input.move_end(),
            _ => {}
        }
        DialogAction::Edited
    }

    fn handle_paste(&mut self, text: &str) {
        match self.state.popup {
            Some(Popup::EditSystemPrompt) | Some(Popup::IngestPath) => {
                self.state.dialog_input.insert_str(text);
            }
            Some(_) => {}
            None if self.state.view == View::Chat => {
                self.state.input.insert_str(text);
                self.state.focus = Focus::Input;
            }
            None => {}
        }
    }

    // ---- actions ----

    fn submit(&mut self) {
        if self.manager.is_loading() {
            return;
        }
        let content = self.state.input.text().trim().to_string();
        if content.is_empty() {
            return;
        }
        match self.manager.send_message(&content, self.mode) {
            Ok(ticket) => {
                self.state.input.clear();
                self.start_request(ticket);
                self.sync_sidebar_cursor();
            }
            Err(e) => self.state.error(e.to_string()),
        }
        self.report_storage_error();
    }

    fn start_request(&mut self, ticket: SendTicket) {
        info!(request_id = ticket.id, mode = ?ticket.mode, "Sending chat request");
        self.state.message_list.follow();
        self.send_command(BackendCommand::Send(ticket));
    }

    fn stop_generation(&mut self) {
        self.manager.stop_generation();
        self.state.info("Generation stopped");
    }

    fn regenerate(&mut self) {
        if self.manager.is_loading() {
            self.state.info("Wait for the current reply to finish");
            return;
        }
        match self.manager.regenerate_last_message(self.mode) {
            Ok(Some(ticket)) => self.start_request(ticket),
            Ok(None) => self.state.info("Nothing to regenerate"),
            Err(e) => self.state.error(e.to_string()),
        }
        self.report_storage_error();
    }

    fn clear_messages(&mut self) {
        if self.manager.is_loading() {
            self.state.info("Wait for the current reply to finish");
            return;
        }
        self.manager.clear_messages();
        self.state.reset_transcript_view();
        self.state.info("Messages cleared");
    }

    fn new_conversation(&mut self) {
        self.manager.new_conversation();
        self.state.reset_transcript_view();
        self.state.view = View::Chat;
        self.state.focus = Focus::Input;
        self.sync_sidebar_cursor();
        self.report_storage_error();
    }

    fn toggle_sidebar(&mut self) {
        self.state.show_sidebar = !self.state.show_sidebar;
        if !self.state.show_sidebar && self.state.focus == Focus::Sidebar {
            self.state.focus = Focus::Input;
        }
    }

    fn upload(&mut self, path: PathBuf) {
        self.state.uploads.push(UploadRecord {
            path: path.clone(),
            status: UploadStatus::Uploading,
        });
        self.state.info(format!("Uploading {}...", file_label(&path)));
        self.send_command(BackendCommand::Ingest(path));
    }

    fn copy_selected_code(&mut self) {
        let Some(index) = self.state.message_list.selected_code else {
            self.state.info("Select a code block with n/p");
            return;
        };
        let code = self
            .manager
            .messages()
            .iter()
            .filter(|m| m.is_assistant())
            .flat_map(|m| markdown::code_blocks(&m.content))
            .nth(index);
        let Some(code) = code else {
            return;
        };
        match self.clipboard.copy(&code) {
            Ok(()) => {
                self.state.mark_copied(Instant::now());
                self.state.set_status("Copied code block", StatusLevel::Success);
            }
            Err(e) => self.state.error(format!("Copy failed: {}", e)),
        }
    }

    // ---- helpers ----

    fn send_command(&self, cmd: BackendCommand) {
        if let Err(e) = self.cmd_tx.blocking_send(cmd) {
            warn!(error = %e, "Backend is gone, command dropped");
        }
    }

    fn sync_sidebar_cursor(&mut self) {
        let conversations = self.manager.conversations();
        let index = self
            .manager
            .current_id()
            .and_then(|id| conversations.iter().position(|c| &c.id == id));
        self.state.sidebar_cursor = index.unwrap_or(0);
        self.state.clamp_sidebar_cursor(conversations.len());
    }

    fn report_storage_error(&mut self) {
        if let Some(e) = self.manager.take_storage_error() {
            self.state.error(format!("Could not save: {}", e));
        }
    }
}

/// File name for status lines, falling back to the full path.
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
