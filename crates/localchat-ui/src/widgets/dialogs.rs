//! Dialog widgets for confirmations and text prompts.

use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;
use crate::widgets::input::InputBuffer;

/// Create a centered rectangle within the given area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// A yes/no confirmation dialog.
#[derive(Debug, Clone)]
pub struct ConfirmDialog<'a> {
    title: &'a str,
    message: &'a str,
    secondary: Option<&'a str>,
    width: u16,
    theme: Theme,
}

impl<'a> ConfirmDialog<'a> {
    pub fn new(title: &'a str, message: &'a str) -> Self {
        Self {
            title,
            message,
            secondary: None,
            width: 50,
            theme: Theme::default(),
        }
    }

    /// Set a secondary message.
    pub fn secondary(mut self, message: &'a str) -> Self {
        self.secondary = Some(message);
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn render(self, frame: &mut Frame) {
        let height = if self.secondary.is_some() { 9 } else { 7 };
        let area = centered_rect(self.width, height, frame.area());
        frame.render_widget(Clear, area);

        let mut lines = vec![Line::from(""), Line::from(self.message)];
        if let Some(secondary) = self.secondary {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(secondary, self.theme.muted_style())));
        }
        lines.push(Line::from(""));
        let key = |style: Style| style.add_modifier(Modifier::BOLD);
        lines.push(Line::from(vec![
            Span::styled("y", key(self.theme.success_style())),
            Span::raw(" confirm   "),
            Span::styled("n/Esc", key(self.theme.error_style())),
            Span::raw(" cancel"),
        ]));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(format!(" {} ", self.title))
                    .borders(Borders::ALL)
                    .border_style(self.theme.focused_border()),
            )
            .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
    }
}

/// Single-line text prompt over an [`InputBuffer`].
#[derive(Debug, Clone)]
pub struct InputDialog<'a> {
    title: &'a str,
    prompt: &'a str,
    buffer: &'a InputBuffer,
    width: u16,
    theme: Theme,
}

impl<'a> InputDialog<'a> {
    pub fn new(title: &'a str, prompt: &'a str, buffer: &'a InputBuffer) -> Self {
        Self {
            title,
            prompt,
            buffer,
            width: 70,
            theme: Theme::default(),
        }
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn render(self, frame: &mut Frame) {
        let area = centered_rect(self.width, 7, frame.area());
        frame.render_widget(Clear, area);

        // Keep the cursor in view by showing the tail of long values.
        let field_width = area.width.saturating_sub(6) as usize;
        let before: String = self.buffer.text().chars().take(self.buffer.cursor()).collect();
        let skip = before.width().saturating_sub(field_width);
        let visible: String = self.buffer.text().chars().skip(skip).collect();
        let cursor_x = before.width() - skip;

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(format!("  {}", self.prompt), self.theme.bold())),
            Line::from(""),
            Line::from(Span::styled(format!("  {}", visible), Style::default().fg(Color::White))),
            Line::from(Span::styled(
                "  [Enter] Submit  [Esc] Cancel",
                self.theme.muted_style(),
            )),
        ];

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.accent))
                .title(format!(" {} ", self.title)),
        );
        frame.render_widget(paragraph, area);

        let x = area.x + 3 + u16::try_from(cursor_x).unwrap_or(0);
        let y = area.y + 4;
        if x < area.right() && y < area.bottom() {
            frame.set_cursor_position(Position::new(x, y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect(40, 10, area), Rect::new(30, 15, 40, 10));
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(5, 5, 20, 8);
        let rect = centered_rect(40, 10, area);
        assert_eq!(rect.width, 20);
        assert_eq!(rect.height, 8);
        assert_eq!(rect.x, 5);
    }
}
