//! Minimal markdown structure for rendering assistant replies.
//!
//! Only what the message views need: fenced code blocks, a handful of block
//! kinds, and inline code/bold spans. Everything else renders as text.

/// A run of prose or a fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Code {
        language: Option<String>,
        code: String,
    },
}

/// Split `content` into prose and fenced code blocks.
///
/// A fence left open at the end (a reply still streaming) still yields a
/// code segment.
pub fn segments(content: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut open: Option<OpenFence> = None;

    for line in content.lines() {
        if let Some(fence) = open.as_mut() {
            if fence.is_closed_by(line) {
                if let Some(fence) = open.take() {
                    out.push(fence.into_segment());
                }
            } else {
                fence.code.push_str(line);
                fence.code.push('\n');
            }
            continue;
        }

        match OpenFence::parse(line) {
            Some(fence) => {
                flush_text(&mut text, &mut out);
                open = Some(fence);
            }
            None => {
                text.push_str(line);
                text.push('\n');
            }
        }
    }

    flush_text(&mut text, &mut out);
    if let Some(fence) = open {
        out.push(fence.into_segment());
    }
    out
}

/// Contents of every fenced code block, in order.
pub fn code_blocks(content: &str) -> Vec<String> {
    segments(content)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Code { code, .. } => Some(code),
            Segment::Text(_) => None,
        })
        .collect()
}

fn flush_text(text: &mut String, out: &mut Vec<Segment>) {
    let trimmed = text.trim_matches('\n');
    if !trimmed.trim().is_empty() {
        out.push(Segment::Text(trimmed.to_string()));
    }
    text.clear();
}

struct OpenFence {
    marker: char,
    len: usize,
    language: Option<String>,
    code: String,
}

impl OpenFence {
    fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        let info = trimmed[len..].trim();
        let language = info.split_whitespace().next().map(str::to_string);
        Some(Self {
            marker,
            len,
            language,
            code: String::new(),
        })
    }

    fn is_closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.chars().count() >= self.len && trimmed.chars().all(|c| c == self.marker)
    }

    fn into_segment(self) -> Segment {
        let code = self.code.strip_suffix('\n').unwrap_or(&self.code).to_string();
        Segment::Code {
            language: self.language,
            code,
        }
    }
}

/// Kind of a prose line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block<'a> {
    Blank,
    Heading { level: u8, text: &'a str },
    Bullet { indent: usize, text: &'a str },
    Numbered { indent: usize, marker: &'a str, text: &'a str },
    Quote(&'a str),
    Rule,
    Paragraph(&'a str),
}

/// Classify a single line of prose.
pub fn classify_line(line: &str) -> Block<'_> {
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();

    if trimmed.is_empty() {
        return Block::Blank;
    }

    let rule = trimmed.trim_end();
    if rule.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|m| rule.chars().all(|c| c == *m))
    {
        return Block::Rule;
    }

    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) {
        if let Some(text) = trimmed[hashes..].strip_prefix(' ') {
            return Block::Heading {
                level: hashes as u8,
                text: text.trim(),
            };
        }
    }

    for bullet in ["- ", "* ", "+ "] {
        if let Some(text) = trimmed.strip_prefix(bullet) {
            return Block::Bullet { indent, text };
        }
    }

    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let after = &trimmed[digits..];
        if let Some(text) = after.strip_prefix(". ").or_else(|| after.strip_prefix(") ")) {
            return Block::Numbered {
                indent,
                marker: &trimmed[..digits + 1],
                text,
            };
        }
    }

    if let Some(text) = trimmed.strip_prefix('>') {
        return Block::Quote(text.trim_start());
    }

    Block::Paragraph(line)
}

/// Inline span within a prose line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inline<'a> {
    Plain(&'a str),
    Code(&'a str),
    Bold(&'a str),
}

/// Split a line into plain text, `code` and **bold** spans.
///
/// Unmatched markers are kept as plain text.
pub fn inline_spans(line: &str) -> Vec<Inline<'_>> {
    let mut spans = Vec::new();
    let mut rest = line;

    while !rest.is_empty() {
        let code = rest.find('`').map(|i| (i, "`"));
        let bold = rest.find("**").map(|i| (i, "**"));
        let next = match (code, bold) {
            (Some(c), Some(b)) => Some(if c.0 <= b.0 { c } else { b }),
            (c, b) => c.or(b),
        };
        let Some((start, marker)) = next else {
            spans.push(Inline::Plain(rest));
            break;
        };

        let after = &rest[start + marker.len()..];
        match after.find(marker) {
            Some(end) if end > 0 => {
                if start > 0 {
                    spans.push(Inline::Plain(&rest[..start]));
                }
                let inner = &after[..end];
                spans.push(if marker == "`" {
                    Inline::Code(inner)
                } else {
                    Inline::Bold(inner)
                });
                rest = &after[end + marker.len()..];
            }
            _ => {
                spans.push(Inline::Plain(&rest[..start + marker.len()]));
                rest = after;
            }
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_split_prose_and_code() {
        let content = "Here you go:\n\n```rust\nfn main() {}\n```\n\nDone.";
        assert_eq!(
            segments(content),
            vec![
                Segment::Text("Here you go:".into()),
                Segment::Code {
                    language: Some("rust".into()),
                    code: "fn main() {}".into()
                },
                Segment::Text("Done.".into()),
            ]
        );
    }

    #[test]
    fn test_unterminated_fence_is_code() {
        let segs = segments("Start\n~~~\nlet x = 1;");
        assert_eq!(
            segs[1],
            Segment::Code {
                language: None,
                code: "let x = 1;".into()
            }
        );
    }

    #[test]
    fn test_shorter_fence_does_not_close() {
        let blocks = code_blocks("````md\n```\ninner\n```\n````");
        assert_eq!(blocks, vec!["```\ninner\n```".to_string()]);
    }

    #[test]
    fn test_code_blocks_in_order() {
        let blocks = code_blocks("```\na\n```\ntext\n```py\nb\n```");
        assert_eq!(blocks, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_classify_lines() {
        assert_eq!(classify_line("## Title"), Block::Heading { level: 2, text: "Title" });
        assert_eq!(classify_line("  - item"), Block::Bullet { indent: 2, text: "item" });
        assert_eq!(
            classify_line("3. third"),
            Block::Numbered { indent: 0, marker: "3.", text: "third" }
        );
        assert_eq!(classify_line("> quoted"), Block::Quote("quoted"));
        assert_eq!(classify_line("---"), Block::Rule);
        assert_eq!(classify_line("   "), Block::Blank);
        assert_eq!(classify_line("#hashtag"), Block::Paragraph("#hashtag"));
    }

    #[test]
    fn test_inline_spans() {
        assert_eq!(
            inline_spans("Use `cargo` for **fast** builds"),
            vec![
                Inline::Plain("Use "),
                Inline::Code("cargo"),
                Inline::Plain(" for "),
                Inline::Bold("fast"),
                Inline::Plain(" builds"),
            ]
        );
    }

    #[test]
    fn test_unmatched_marker_is_plain() {
        let spans = inline_spans("a ` b");
        let text: String = spans
            .iter()
            .map(|s| match s {
                Inline::Plain(t) | Inline::Code(t) | Inline::Bold(t) => *t,
            })
            .collect();
        assert_eq!(text, "a ` b");
        assert!(spans.iter().all(|s| matches!(s, Inline::Plain(_))));
    }
}
