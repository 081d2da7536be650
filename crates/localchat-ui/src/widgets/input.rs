//! Multi-line message input.

use ratatui::layout::{Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;

/// Most text rows the input grows to before scrolling.
pub const MAX_VISIBLE_LINES: u16 = 8;

/// Editable text with a cursor, measured in characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    cursor: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the contents and put the cursor at the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    /// Take the contents, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, ch);
        self.cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert('\n');
    }

    pub fn insert_str(&mut self, text: &str) {
        let at = self.byte_index(self.cursor);
        self.text.insert_str(at, text);
        self.cursor += text.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    /// Move to the start of the current line.
    pub fn move_home(&mut self) {
        let (row, _) = self.cursor_row_col();
        self.cursor = self.line_start(row);
    }

    /// Move to the end of the current line.
    pub fn move_end(&mut self) {
        let (row, _) = self.cursor_row_col();
        let len = self.text.split('\n').nth(row).map_or(0, |l| l.chars().count());
        self.cursor = self.line_start(row) + len;
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Row and character column of the cursor.
    pub fn cursor_row_col(&self) -> (usize, usize) {
        let before: String = self.text.chars().take(self.cursor).collect();
        let row = before.matches('\n').count();
        let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count());
        (row, col)
    }

    fn line_start(&self, row: usize) -> usize {
        self.text
            .split('\n')
            .take(row)
            .map(|l| l.chars().count() + 1)
            .sum()
    }
}

/// Input box that grows with its content up to [`MAX_VISIBLE_LINES`].
#[derive(Debug, Clone)]
pub struct MessageInput<'a> {
    buffer: &'a InputBuffer,
    focused: bool,
    /// A request is in flight; typing is allowed but submit is not.
    loading: bool,
    streaming: bool,
    theme: Theme,
}

impl<'a> MessageInput<'a> {
    pub fn new(buffer: &'a InputBuffer) -> Self {
        Self {
            buffer,
            focused: false,
            loading: false,
            streaming: false,
            theme: Theme::default(),
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Height needed for `buffer`, borders included.
    pub fn height(buffer: &InputBuffer) -> u16 {
        let lines = u16::try_from(buffer.line_count()).unwrap_or(u16::MAX);
        lines.clamp(1, MAX_VISIBLE_LINES) + 2
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let hint = if self.streaming {
            " Esc stop "
        } else if self.loading {
            " Waiting for reply... "
        } else {
            " Enter send | Shift+Enter newline "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border(self.focused))
            .title(" Message ")
            .title_bottom(Line::from(Span::styled(hint, self.theme.muted_style())));

        let inner_width = area.width.saturating_sub(2) as usize;
        let inner_height = area.height.saturating_sub(2) as usize;
        let (row, col) = self.buffer.cursor_row_col();

        let current_line = self.buffer.text().split('\n').nth(row).unwrap_or("");
        let col_width: usize = current_line.chars().take(col).collect::<String>().width();

        let row_offset = (row + 1).saturating_sub(inner_height);
        let col_offset = (col_width + 1).saturating_sub(inner_width);

        let paragraph = if self.buffer.text().is_empty() {
            let placeholder = if self.loading { "" } else { "Send a message..." };
            Paragraph::new(Span::styled(placeholder, self.theme.muted_style()))
        } else {
            Paragraph::new(self.buffer.text())
                .scroll((to_u16(row_offset), to_u16(col_offset)))
        };
        frame.render_widget(paragraph.block(block), area);

        if self.focused && inner_width > 0 && inner_height > 0 {
            let x = area.x + 1 + to_u16(col_width - col_offset);
            let y = area.y + 1 + to_u16(row - row_offset);
            frame.set_cursor_position(Position::new(x, y));
        }
    }
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_backspace_multibyte() {
        let mut buffer = InputBuffer::new();
        for ch in "héllo".chars() {
            buffer.insert(ch);
        }
        buffer.move_left();
        buffer.move_left();
        buffer.backspace();
        assert_eq!(buffer.text(), "hélo");
        assert_eq!(buffer.cursor(), 2);
        buffer.delete();
        assert_eq!(buffer.text(), "héo");
    }

    #[test]
    fn test_newlines_and_line_navigation() {
        let mut buffer = InputBuffer::new();
        buffer.insert_str("first");
        buffer.insert_newline();
        buffer.insert_str("second");
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(buffer.cursor_row_col(), (1, 6));

        buffer.move_home();
        assert_eq!(buffer.cursor_row_col(), (1, 0));
        buffer.move_left();
        assert_eq!(buffer.cursor_row_col(), (0, 5));
        buffer.move_home();
        buffer.move_end();
        assert_eq!(buffer.cursor(), 5);
    }

    #[test]
    fn test_take_empties_buffer() {
        let mut buffer = InputBuffer::new();
        buffer.set_text("  hi  ");
        assert!(!buffer.is_blank());
        assert_eq!(buffer.take(), "  hi  ");
        assert!(buffer.is_blank());
        assert_eq!(buffer.cursor(), 0);
    }

    #[test]
    fn test_height_grows_and_caps() {
        let mut buffer = InputBuffer::new();
        assert_eq!(MessageInput::height(&buffer), 3);
        buffer.set_text("a\nb\nc");
        assert_eq!(MessageInput::height(&buffer), 5);
        buffer.set_text("x\n".repeat(20));
        assert_eq!(MessageInput::height(&buffer), MAX_VISIBLE_LINES + 2);
    }
}
