//! Light markdown styling for assistant replies.

use localchat_core::markdown::{classify_line, inline_spans, segments, Block, Inline, Segment};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;
use crate::utils::wrap_text;

/// Which code block is selected for copying, counted across the whole list.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeSelection {
    /// Global index of this message's first code block.
    pub first_index: usize,
    pub selected: Option<usize>,
    pub copied: bool,
}

/// Styled lines of one message.
#[derive(Debug, Clone, Default)]
pub struct RenderedMarkdown {
    pub lines: Vec<Line<'static>>,
    /// Number of fenced code blocks rendered.
    pub code_blocks: usize,
}

/// Render `content` as styled lines no wider than `width`.
pub fn render_markdown(
    content: &str,
    width: usize,
    theme: &Theme,
    selection: CodeSelection,
) -> RenderedMarkdown {
    let width = width.max(4);
    let mut out = RenderedMarkdown::default();

    for segment in segments(content) {
        match segment {
            Segment::Text(text) => {
                for line in text.lines() {
                    render_prose_line(line, width, theme, &mut out.lines);
                }
            }
            Segment::Code { language, code } => {
                let index = selection.first_index + out.code_blocks;
                out.code_blocks += 1;
                let state = match selection.selected {
                    Some(selected) if selected == index && selection.copied => BlockState::Copied,
                    Some(selected) if selected == index => BlockState::Selected,
                    _ => BlockState::Idle,
                };
                render_code_block(language.as_deref(), &code, width, theme, state, &mut out.lines);
            }
        }
    }
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BlockState {
    Idle,
    Selected,
    Copied,
}

fn render_prose_line(line: &str, width: usize, theme: &Theme, lines: &mut Vec<Line<'static>>) {
    match classify_line(line) {
        Block::Blank => lines.push(Line::default()),
        Block::Rule => lines.push(Line::styled("─".repeat(width.min(40)), theme.muted_style())),
        Block::Heading { text, .. } => {
            for wrapped in wrap_text(text, width) {
                lines.push(Line::from(Span::styled(wrapped, theme.heading_style())));
            }
        }
        Block::Bullet { indent, text } => {
            let prefix = format!("{}• ", " ".repeat(indent));
            push_prefixed(&prefix, text, width, theme, Style::default(), lines);
        }
        Block::Numbered { indent, marker, text } => {
            let prefix = format!("{}{} ", " ".repeat(indent), marker);
            push_prefixed(&prefix, text, width, theme, Style::default(), lines);
        }
        Block::Quote(text) => {
            let base = theme.muted_style().add_modifier(Modifier::ITALIC);
            push_prefixed("│ ", text, width, theme, base, lines);
        }
        Block::Paragraph(text) => {
            for wrapped in wrap_text(text, width) {
                lines.push(Line::from(styled_inline(&wrapped, theme, Style::default())));
            }
        }
    }
}

fn push_prefixed(
    prefix: &str,
    text: &str,
    width: usize,
    theme: &Theme,
    base: Style,
    lines: &mut Vec<Line<'static>>,
) {
    let prefix_width = prefix.width();
    let continuation = " ".repeat(prefix_width);
    for (i, wrapped) in wrap_text(text, width.saturating_sub(prefix_width).max(1))
        .into_iter()
        .enumerate()
    {
        let lead = if i == 0 { prefix.to_string() } else { continuation.clone() };
        let mut spans = vec![Span::styled(lead, Style::default().fg(theme.accent))];
        spans.extend(styled_inline(&wrapped, theme, base));
        lines.push(Line::from(spans));
    }
}

fn styled_inline(text: &str, theme: &Theme, base: Style) -> Vec<Span<'static>> {
    inline_spans(text)
        .into_iter()
        .map(|span| match span {
            Inline::Plain(t) => Span::styled(t.to_string(), base),
            Inline::Code(t) => Span::styled(t.to_string(), theme.code_style()),
            Inline::Bold(t) => Span::styled(t.to_string(), base.add_modifier(Modifier::BOLD)),
        })
        .collect()
}

fn render_code_block(
    language: Option<&str>,
    code: &str,
    width: usize,
    theme: &Theme,
    state: BlockState,
    lines: &mut Vec<Line<'static>>,
) {
    let border = match state {
        BlockState::Idle => theme.muted_style(),
        BlockState::Selected | BlockState::Copied => theme.focused_border(),
    };

    let mut header = vec![
        Span::styled("╭─ ", border),
        Span::styled(language.unwrap_or("text").to_string(), theme.bold()),
    ];
    match state {
        BlockState::Idle => {}
        BlockState::Selected => {
            header.push(Span::styled("  [y] copy", theme.muted_style()));
        }
        BlockState::Copied => {
            header.push(Span::styled("  Copied!", theme.success_style()));
        }
    }
    lines.push(Line::from(header));

    let inner = width.saturating_sub(2).max(1);
    for line in code.split('\n') {
        for wrapped in wrap_text(line, inner) {
            lines.push(Line::from(vec![
                Span::styled("│ ", border),
                Span::styled(wrapped, theme.code_style()),
            ]));
        }
    }
    lines.push(Line::from(Span::styled("╰─", border)));
}
