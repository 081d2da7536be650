//! Text utilities for TUI rendering.

use std::fmt;

use chrono::{DateTime, Datelike, TimeZone};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Wrap text to fit within a given width, breaking at spaces when possible.
///
/// Words longer than the width are split by character. Widths are display
/// columns, so wide characters count double.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![];
    }

    let mut lines = Vec::new();
    for line in text.lines() {
        wrap_line(line, width, &mut lines);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_line(line: &str, width: usize, out: &mut Vec<String>) {
    if line.is_empty() {
        out.push(String::new());
        return;
    }

    let mut current = String::new();
    let mut current_width = 0;

    for word in line.split_inclusive(' ') {
        let word_width = word.width();
        let visible_width = word.trim_end_matches(' ').width();

        if current_width + visible_width > width && !current.is_empty() {
            out.push(current.trim_end().to_string());
            current.clear();
            current_width = 0;
        }

        if visible_width > width {
            for ch in word.chars() {
                let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);
                if current_width + ch_width > width && !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push(ch);
                current_width += ch_width;
            }
            continue;
        }

        current.push_str(word);
        current_width += word_width;
    }

    out.push(current.trim_end().to_string());
}

/// Wrap text and prefix every line with `indent`.
pub fn wrap_text_indented(text: &str, width: usize, indent: &str) -> Vec<String> {
    let effective_width = width.saturating_sub(indent.width());
    if effective_width == 0 {
        return vec![format!("{}{}", indent, text)];
    }

    wrap_text(text, effective_width)
        .into_iter()
        .map(|line| format!("{}{}", indent, line))
        .collect()
}

/// Truncate a string to fit within a given width, adding ellipsis if needed.
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width < 3 {
        return text.chars().take(max_width).collect();
    }

    let mut width = 0;
    let mut result = String::new();
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);
        if width + ch_width > max_width - 3 {
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result.push_str("...");
    result
}

/// Short label for a conversation timestamp relative to `now`.
///
/// Same day shows the time, same year the month and day, otherwise the
/// full date.
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    if at.date_naive() == now.date_naive() {
        at.format("%H:%M").to_string()
    } else if at.year() == now.year() {
        at.format("%b %d").to_string()
    } else {
        at.format("%Y-%m-%d").to_string()
    }
}
