//! Header widget: title, view tabs, and backend status.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use ratatui::Frame;

use crate::theme::Theme;

/// Status indicator for the header.
#[derive(Debug, Clone)]
pub struct StatusIndicator {
    pub label: String,
    pub color: Color,
}

impl StatusIndicator {
    pub fn new(label: impl Into<String>, color: Color) -> Self {
        Self {
            label: label.into(),
            color,
        }
    }

    pub fn success(label: impl Into<String>) -> Self {
        Self::new(label, Color::Green)
    }

    pub fn warning(label: impl Into<String>) -> Self {
        Self::new(label, Color::Yellow)
    }

    pub fn error(label: impl Into<String>) -> Self {
        Self::new(label, Color::Red)
    }
}

/// Header widget with title, tabs, backend status and active model.
#[derive(Debug, Clone)]
pub struct Header<'a> {
    title: &'a str,
    status: Option<StatusIndicator>,
    tabs: Vec<&'a str>,
    selected_tab: usize,
    model: Option<&'a str>,
    theme: Theme,
}

impl<'a> Header<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            status: None,
            tabs: Vec::new(),
            selected_tab: 0,
            model: None,
            theme: Theme::default(),
        }
    }

    pub fn status(mut self, status: StatusIndicator) -> Self {
        self.status = Some(status);
        self
    }

    pub fn tabs(mut self, tabs: Vec<&'a str>, selected: usize) -> Self {
        self.tabs = tabs;
        self.selected_tab = selected;
        self
    }

    /// Show the active model on the right.
    pub fn model(mut self, model: &'a str) -> Self {
        self.model = Some(model);
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let model_width = self
            .model
            .map_or(0, |m| u16::try_from(m.chars().count() + 12).unwrap_or(u16::MAX));
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(model_width)])
            .split(area);

        let mut title_spans = vec![Span::styled(
            format!(" {} ", self.title),
            self.theme.bold().fg(self.theme.accent),
        )];
        if let Some(status) = &self.status {
            title_spans.push(Span::styled(
                format!("[{}]", status.label),
                Style::default().fg(status.color),
            ));
            title_spans.push(Span::raw(" "));
        }

        let tab_titles: Vec<Line> = self
            .tabs
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let style = if i == self.selected_tab {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(format!(" F{} {} ", i + 1, name), style))
            })
            .collect();

        let tabs_widget = Tabs::new(tab_titles)
            .block(Block::default().title(Line::from(title_spans)).borders(Borders::ALL))
            .select(self.selected_tab)
            .divider("|");
        frame.render_widget(tabs_widget, chunks[0]);

        if let Some(model) = self.model {
            let model_widget = Paragraph::new(Line::from(vec![
                Span::raw(" model: "),
                Span::styled(model, Style::default().fg(Color::Cyan)),
            ]))
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(model_widget, chunks[1]);
        }
    }
}
