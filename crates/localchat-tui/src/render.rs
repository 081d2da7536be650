//! Main render function for the TUI.

use chrono::Local;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use localchat_core::{ConversationManager, KeyValueStore, Message, Role};
use localchat_ui::{
    format_timestamp, ConfirmDialog, ConversationItem, ConversationList, Footer, Header,
    InputDialog, MessageInput, MessageList, MessageRole, MessageView, SettingsPanel,
    StatusIndicator, StatusLevel, Theme,
};

use crate::event::BackendStatus;
use crate::state::{Focus, Popup, UiState, UploadStatus, View};

const SIDEBAR_WIDTH: u16 = 32;

/// Render the entire UI.
pub fn render<S: KeyValueStore>(
    frame: &mut Frame,
    state: &mut UiState,
    manager: &ConversationManager<S>,
    theme: &Theme,
) {
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, header_area, state, manager, theme);

    match state.view {
        View::Chat => render_chat(frame, body_area, state, manager, theme),
        View::KnowledgeBase => render_knowledge_base(frame, body_area, state, manager, theme),
    }

    render_footer(frame, footer_area, state, manager, theme);
    render_popup(frame, state, manager, theme);
}

fn render_header<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    state: &UiState,
    manager: &ConversationManager<S>,
    theme: &Theme,
) {
    let status = match &state.backend {
        BackendStatus::Checking => StatusIndicator::warning("connecting"),
        BackendStatus::Online => StatusIndicator::success("online"),
        BackendStatus::Offline(_) => StatusIndicator::error("offline"),
    };

    Header::new("LocalChat")
        .status(status)
        .tabs(View::TITLES.to_vec(), state.view.index())
        .model(&manager.settings().model)
        .theme(theme.clone())
        .render(frame, area);
}

fn render_chat<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    state: &mut UiState,
    manager: &ConversationManager<S>,
    theme: &Theme,
) {
    let main_area = if state.show_sidebar {
        let [sidebar_area, main_area] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)]).areas(area);
        render_sidebar(frame, sidebar_area, state, manager, theme);
        main_area
    } else {
        area
    };

    let input_height = MessageInput::height(&state.input);
    let [messages_area, input_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(input_height)]).areas(main_area);

    let views: Vec<MessageView> = manager.messages().iter().map(message_view).collect();
    let title = manager
        .current_conversation()
        .map_or_else(|| " Chat ".to_string(), |c| format!(" {} ", c.title));

    MessageList::new(&views)
        .loading(manager.is_loading())
        .streaming(manager.is_streaming())
        .focused(state.focus == Focus::Messages && state.popup.is_none())
        .title(title)
        .theme(theme.clone())
        .render(frame, messages_area, &mut state.message_list);

    MessageInput::new(&state.input)
        .focused(state.focus == Focus::Input && state.popup.is_none())
        .loading(manager.is_loading())
        .streaming(manager.is_streaming())
        .theme(theme.clone())
        .render(frame, input_area);
}

fn render_sidebar<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    state: &UiState,
    manager: &ConversationManager<S>,
    theme: &Theme,
) {
    let now = Local::now();
    let current = manager.current_id();
    let items: Vec<ConversationItem> = manager
        .conversations()
        .iter()
        .map(|c| ConversationItem {
            title: &c.title,
            updated: format_timestamp(&c.updated_at.with_timezone(&Local), &now),
            message_count: c.messages.len(),
            current: current == Some(&c.id),
        })
        .collect();

    let focused = state.focus == Focus::Sidebar && state.popup.is_none();
    ConversationList::new(&items)
        .cursor(focused.then_some(state.sidebar_cursor))
        .focused(focused)
        .theme(theme.clone())
        .render(frame, area);
}

fn render_knowledge_base<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    state: &UiState,
    manager: &ConversationManager<S>,
    theme: &Theme,
) {
    let [intro_area, uploads_area] =
        Layout::vertical([Constraint::Length(7), Constraint::Fill(1)]).areas(area);

    let kb_state = if manager.settings().use_knowledge_base {
        Span::styled("enabled", theme.success_style())
    } else {
        Span::styled("disabled (Ctrl+O to enable)", theme.muted_style())
    };
    let intro = Paragraph::new(vec![
        Line::from("Upload documents so the assistant can answer questions about them."),
        Line::from(""),
        Line::from(vec![Span::raw("Knowledge base in chat: "), kb_state]),
        Line::from(""),
        Line::from(Span::styled(
            "Press u or Enter and type the path of a file to upload.",
            theme.muted_style(),
        )),
    ])
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.unfocused_border())
            .title(" Knowledge Base "),
    );
    frame.render_widget(intro, intro_area);

    let items: Vec<ListItem> = if state.uploads.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No documents uploaded in this session",
            theme.muted_style(),
        )))]
    } else {
        state
            .uploads
            .iter()
            .rev()
            .map(|upload| {
                let (marker, detail, style) = match &upload.status {
                    UploadStatus::Uploading => ("…", "uploading".to_string(), theme.warning_style()),
                    UploadStatus::Done(summary) => ("✓", summary.clone(), theme.success_style()),
                    UploadStatus::Failed(error) => ("✗", error.clone(), theme.error_style()),
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {} ", marker), style),
                    Span::raw(upload.path.display().to_string()),
                    Span::styled(format!("  {}", detail), theme.muted_style()),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.unfocused_border())
            .title(format!(" Uploads ({}) ", state.uploads.len())),
    );
    frame.render_widget(list, uploads_area);
}

fn render_footer<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    state: &UiState,
    manager: &ConversationManager<S>,
    theme: &Theme,
) {
    let offline = match &state.backend {
        BackendStatus::Offline(reason) => Some(format!("Backend unreachable: {}", reason)),
        _ => None,
    };

    let help = help_text(state, manager.is_loading());
    let mut footer = Footer::new(help).theme(theme.clone());
    if let Some(status) = &state.status {
        footer = footer.status(&status.text, status.level);
    } else if let Some(offline) = &offline {
        footer = footer.status(offline, StatusLevel::Error);
    }
    footer.render(frame, area);
}

fn help_text(state: &UiState, loading: bool) -> &'static str {
    match (&state.popup, state.view, state.focus) {
        (Some(Popup::Settings), _, _) => "Esc close ",
        (Some(Popup::ConfirmDelete(_)), _, _) => "y confirm | n cancel ",
        (Some(_), _, _) => "Enter submit | Esc cancel ",
        (None, View::KnowledgeBase, _) => "u upload | F1 chat | Ctrl+Q quit ",
        (None, View::Chat, _) if loading => "Esc stop | Ctrl+Q quit ",
        (None, View::Chat, Focus::Input) => {
            "Tab focus | Ctrl+N new | Ctrl+R regen | Ctrl+L clear | Ctrl+O settings | Ctrl+Q quit "
        }
        (None, View::Chat, Focus::Messages) => "j/k scroll | n/p code block | y copy | Tab focus ",
        (None, View::Chat, Focus::Sidebar) => "j/k move | Enter open | d delete | Tab focus ",
    }
}

fn render_popup<S: KeyValueStore>(
    frame: &mut Frame,
    state: &UiState,
    manager: &ConversationManager<S>,
    theme: &Theme,
) {
    let Some(popup) = &state.popup else {
        return;
    };
    match popup {
        Popup::Settings => {
            SettingsPanel::new(manager.settings(), &state.models)
                .fallback(state.models_fallback)
                .selected(state.settings_field)
                .theme(theme.clone())
                .render(frame);
        }
        Popup::EditSystemPrompt => {
            InputDialog::new("System Prompt", "Instructions sent with every request:", &state.dialog_input)
                .theme(theme.clone())
                .render(frame);
        }
        Popup::IngestPath => {
            InputDialog::new("Upload Document", "Path of the file to upload:", &state.dialog_input)
                .theme(theme.clone())
                .render(frame);
        }
        Popup::ConfirmDelete(id) => {
            let title = manager
                .conversations()
                .iter()
                .find(|c| &c.id == id)
                .map_or("this conversation", |c| c.title.as_str());
            let message = format!("Delete \"{}\"?", title);
            ConfirmDialog::new("Delete Conversation", &message)
                .secondary("This cannot be undone.")
                .theme(theme.clone())
                .render(frame);
        }
    }
}

fn message_view(message: &Message) -> MessageView<'_> {
    MessageView {
        role: match message.role {
            Role::User => MessageRole::User,
            Role::Assistant => MessageRole::Assistant,
            Role::System => MessageRole::System,
        },
        content: &message.content,
        timestamp: message.timestamp,
    }
}
