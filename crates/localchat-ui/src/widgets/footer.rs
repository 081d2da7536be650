//! Footer with a status message and key help.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;

/// Severity of a footer status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// Footer widget: status on the left, help text on the right.
#[derive(Debug, Clone)]
pub struct Footer<'a> {
    help: &'a str,
    status: Option<(&'a str, StatusLevel)>,
    theme: Theme,
}

impl<'a> Footer<'a> {
    pub fn new(help: &'a str) -> Self {
        Self {
            help,
            status: None,
            theme: Theme::default(),
        }
    }

    pub fn status(mut self, message: &'a str, level: StatusLevel) -> Self {
        self.status = Some((message, level));
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let help_width = u16::try_from(self.help.width() + 1).unwrap_or(u16::MAX);
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(help_width)])
            .split(area);

        if let Some((message, level)) = self.status {
            let style = match level {
                StatusLevel::Info => self.theme.warning_style(),
                StatusLevel::Success => self.theme.success_style(),
                StatusLevel::Error => self.theme.error_style(),
            };
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(format!(" {}", message), style))),
                chunks[0],
            );
        }

        frame.render_widget(
            Paragraph::new(self.help).style(self.theme.muted_style()),
            chunks[1],
        );
    }
}
