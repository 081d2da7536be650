//! Sidebar listing saved conversations.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::theme::Theme;
use crate::utils::truncate;

/// One row of the conversation list.
#[derive(Debug, Clone)]
pub struct ConversationItem<'a> {
    pub title: &'a str,
    /// Preformatted last-updated label.
    pub updated: String,
    pub message_count: usize,
    /// This is the open conversation.
    pub current: bool,
}

/// Conversation list widget. Emits nothing itself; the caller maps keys to
/// select/new/delete actions.
#[derive(Debug, Clone)]
pub struct ConversationList<'a> {
    items: &'a [ConversationItem<'a>],
    /// Cursor row while the list has focus.
    cursor: Option<usize>,
    focused: bool,
    theme: Theme,
}

impl<'a> ConversationList<'a> {
    pub fn new(items: &'a [ConversationItem<'a>]) -> Self {
        Self {
            items,
            cursor: None,
            focused: false,
            theme: Theme::default(),
        }
    }

    pub fn cursor(mut self, cursor: Option<usize>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border(self.focused))
            .title(format!(" Conversations ({}) ", self.items.len()));

        if self.items.is_empty() {
            let hint = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(" No conversations yet", self.theme.muted_style())),
                Line::from(Span::styled(" Ctrl+N to start one", self.theme.muted_style())),
            ])
            .block(block);
            frame.render_widget(hint, area);
            return;
        }

        let title_width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| {
                let marker = if item.current { "● " } else { "  " };
                let title_style = if item.current {
                    self.theme.bold().fg(self.theme.accent)
                } else {
                    self.theme.bold()
                };
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(marker, self.theme.focused_border()),
                        Span::styled(truncate(item.title, title_width), title_style),
                    ]),
                    Line::from(Span::styled(
                        format!("  {} · {} msgs", item.updated, item.message_count),
                        self.theme.muted_style(),
                    )),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(self.theme.selected_style().remove_modifier(Modifier::BOLD));

        let mut state = ListState::default();
        if self.focused {
            state.select(self.cursor.map(|c| c.min(self.items.len() - 1)));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen(list: ConversationList) -> String {
        let mut terminal = Terminal::new(TestBackend::new(30, 10)).unwrap();
        terminal.draw(|frame| list.render(frame, frame.area())).unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_empty_list_hint() {
        let out = screen(ConversationList::new(&[]));
        assert!(out.contains("No conversations yet"));
    }

    #[test]
    fn test_marks_current_and_truncates_titles() {
        let items = [
            ConversationItem {
                title: "A very long conversation title that overflows",
                updated: "09:30".into(),
                message_count: 4,
                current: true,
            },
            ConversationItem {
                title: "Short",
                updated: "Mar 02".into(),
                message_count: 2,
                current: false,
            },
        ];
        let out = screen(ConversationList::new(&items).focused(true).cursor(Some(1)));
        assert!(out.contains("● A very long"));
        assert!(out.contains("..."));
        assert!(out.contains("Mar 02 · 2 msgs"));
        assert!(out.contains("Conversations (2)"));
    }
}
