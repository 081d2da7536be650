//! Message list widget for displaying the current conversation.

use chrono::{DateTime, Local, Utc};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::theme::Theme;
use crate::utils::wrap_text_indented;
use crate::widgets::markdown::{render_markdown, CodeSelection};

const STREAM_CURSOR: &str = "▌";

/// Role of a chat message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// A single message to draw.
#[derive(Debug, Clone)]
pub struct MessageView<'a> {
    pub role: MessageRole,
    pub content: &'a str,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Scroll position and code block selection, kept between frames.
#[derive(Debug, Clone, Default)]
pub struct MessageListState {
    /// Top line offset, `None` follows the newest message.
    offset: Option<usize>,
    /// Largest offset seen at the last render.
    max_offset: usize,
    /// Code blocks seen at the last render.
    code_blocks: usize,
    pub selected_code: Option<usize>,
    /// Show the "copied" acknowledgement on the selected block.
    pub copied: bool,
}

impl MessageListState {
    pub fn is_following(&self) -> bool {
        self.offset.is_none()
    }

    /// Jump back to the newest message.
    pub fn follow(&mut self) {
        self.offset = None;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let current = self.offset.unwrap_or(self.max_offset);
        self.offset = Some(current.saturating_sub(lines));
    }

    pub fn scroll_down(&mut self, lines: usize) {
        if let Some(current) = self.offset {
            let next = current + lines;
            self.offset = if next >= self.max_offset { None } else { Some(next) };
        }
    }

    pub fn code_blocks(&self) -> usize {
        self.code_blocks
    }

    /// Select the next code block, wrapping around.
    pub fn select_next_code(&mut self) {
        if self.code_blocks == 0 {
            self.selected_code = None;
            return;
        }
        self.copied = false;
        self.selected_code = Some(match self.selected_code {
            Some(i) if i + 1 < self.code_blocks => i + 1,
            _ => 0,
        });
    }

    /// Select the previous code block, wrapping around.
    pub fn select_prev_code(&mut self) {
        if self.code_blocks == 0 {
            self.selected_code = None;
            return;
        }
        self.copied = false;
        self.selected_code = Some(match self.selected_code {
            Some(i) if i > 0 && i <= self.code_blocks => i - 1,
            _ => self.code_blocks - 1,
        });
    }

    /// Forget the selection, e.g. after switching conversations.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Widget drawing the conversation transcript.
#[derive(Debug, Clone)]
pub struct MessageList<'a> {
    messages: &'a [MessageView<'a>],
    /// A request is in flight.
    loading: bool,
    /// The last assistant message is still receiving fragments.
    streaming: bool,
    focused: bool,
    title: Option<String>,
    theme: Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [MessageView<'a>]) -> Self {
        Self {
            messages,
            loading: false,
            streaming: false,
            focused: false,
            title: None,
            theme: Theme::default(),
        }
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Render the widget.
    pub fn render(self, frame: &mut Frame, area: Rect, state: &mut MessageListState) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border(self.focused))
            .title(self.title.clone().unwrap_or_else(|| " Chat ".to_string()));

        if self.messages.is_empty() && !self.loading {
            state.code_blocks = 0;
            state.max_offset = 0;
            frame.render_widget(self.empty_state(area).block(block), area);
            return;
        }

        let visible_height = area.height.saturating_sub(2) as usize;
        let text_width = area.width.saturating_sub(2) as usize;
        let all_lines = self.build_lines(text_width, state);

        let total_lines = all_lines.len();
        let max_offset = total_lines.saturating_sub(visible_height);
        state.max_offset = max_offset;
        let offset = match state.offset {
            Some(offset) if offset < max_offset => offset,
            Some(_) => {
                state.offset = None;
                max_offset
            }
            None => max_offset,
        };

        let lines: Vec<Line> = all_lines
            .into_iter()
            .skip(offset)
            .take(visible_height)
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn build_lines(&self, text_width: usize, state: &mut MessageListState) -> Vec<Line<'static>> {
        let mut all_lines: Vec<Line<'static>> = Vec::new();
        let mut code_blocks = 0;
        let content_width = text_width.saturating_sub(2);

        for (i, msg) in self.messages.iter().enumerate() {
            let is_last = i + 1 == self.messages.len();
            let (label, style) = match msg.role {
                MessageRole::User => ("You", self.theme.user_style()),
                MessageRole::Assistant => ("Assistant", self.theme.assistant_style()),
                MessageRole::System => ("System", self.theme.system_style()),
            };

            let mut header = vec![Span::styled(
                format!("{} ", label),
                style.add_modifier(Modifier::BOLD),
            )];
            if let Some(ts) = msg.timestamp {
                header.push(Span::styled(
                    ts.with_timezone(&Local).format("%H:%M").to_string(),
                    self.theme.muted_style(),
                ));
            }
            all_lines.push(Line::from(header));

            let mut body: Vec<Line<'static>> = match msg.role {
                MessageRole::Assistant => {
                    let rendered = render_markdown(
                        msg.content,
                        content_width,
                        &self.theme,
                        CodeSelection {
                            first_index: code_blocks,
                            selected: state.selected_code,
                            copied: state.copied,
                        },
                    );
                    code_blocks += rendered.code_blocks;
                    rendered
                        .lines
                        .into_iter()
                        .map(|line| {
                            let mut spans = vec![Span::raw("  ")];
                            spans.extend(line.spans);
                            Line::from(spans)
                        })
                        .collect()
                }
                MessageRole::User | MessageRole::System => {
                    if msg.content.is_empty() {
                        Vec::new()
                    } else {
                        wrap_text_indented(msg.content, text_width, "  ")
                            .into_iter()
                            .map(Line::from)
                            .collect()
                    }
                }
            };

            if is_last && self.streaming && msg.role == MessageRole::Assistant {
                let cursor = Span::styled(STREAM_CURSOR, self.theme.assistant_style());
                match body.last_mut() {
                    Some(line) => line.spans.push(cursor),
                    None => body.push(Line::from(vec![Span::raw("  "), cursor])),
                }
            }

            all_lines.extend(body);
            all_lines.push(Line::from(""));
        }

        let last_is_assistant = self
            .messages
            .last()
            .is_some_and(|m| m.role == MessageRole::Assistant);
        if self.loading && !last_is_assistant {
            all_lines.push(Line::from(Span::styled(
                "  Thinking...",
                self.theme.warning_style().add_modifier(Modifier::ITALIC),
            )));
        }

        state.code_blocks = code_blocks;
        if state.selected_code.is_some_and(|i| i >= code_blocks) {
            state.selected_code = None;
            state.copied = false;
        }
        all_lines
    }

    fn empty_state(&self, area: Rect) -> Paragraph<'static> {
        let top_padding = area.height.saturating_sub(2) / 2;
        let mut lines: Vec<Line> = (1..top_padding).map(|_| Line::from("")).collect();
        lines.push(Line::from(Span::styled(
            "Hello, Human",
            self.theme.heading_style(),
        )));
        lines.push(Line::from(Span::styled(
            "I'm your local AI assistant. Ask me to write code, summarize text, or organize your thoughts.",
            self.theme.muted_style(),
        )));
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(ratatui::widgets::Wrap { trim: true })
    }
}
