//! Model and generation settings popup.

use localchat_core::settings::{MAX_TOKENS_RANGE, TEMPERATURE_RANGE};
use localchat_core::{ChatSettings, ModelInfo};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::theme::Theme;
use crate::utils::truncate;
use crate::widgets::dialogs::centered_rect;

/// Editable rows of the settings panel, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsField {
    #[default]
    Model,
    Temperature,
    MaxTokens,
    SystemPrompt,
    KnowledgeBase,
    MongoTools,
}

impl SettingsField {
    pub const ALL: [SettingsField; 6] = [
        SettingsField::Model,
        SettingsField::Temperature,
        SettingsField::MaxTokens,
        SettingsField::SystemPrompt,
        SettingsField::KnowledgeBase,
        SettingsField::MongoTools,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Model => "Model",
            SettingsField::Temperature => "Temperature",
            SettingsField::MaxTokens => "Max tokens",
            SettingsField::SystemPrompt => "System prompt",
            SettingsField::KnowledgeBase => "Knowledge base",
            SettingsField::MongoTools => "MongoDB tools",
        }
    }
}

/// Settings popup drawn over the chat view.
#[derive(Debug, Clone)]
pub struct SettingsPanel<'a> {
    settings: &'a ChatSettings,
    models: &'a [ModelInfo],
    /// The model list is the offline fallback.
    fallback: bool,
    selected: SettingsField,
    theme: Theme,
}

impl<'a> SettingsPanel<'a> {
    pub fn new(settings: &'a ChatSettings, models: &'a [ModelInfo]) -> Self {
        Self {
            settings,
            models,
            fallback: false,
            selected: SettingsField::default(),
            theme: Theme::default(),
        }
    }

    pub fn fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn selected(mut self, field: SettingsField) -> Self {
        self.selected = field;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn render(self, frame: &mut Frame) {
        let area = centered_rect(64, 15, frame.area());
        frame.render_widget(Clear, area);
        let value_width = area.width.saturating_sub(22) as usize;

        let mut lines = vec![Line::from("")];
        for field in SettingsField::ALL {
            let selected = field == self.selected;
            let marker = if selected { "▸ " } else { "  " };
            let label_style = if selected {
                self.theme.bold().fg(self.theme.accent)
            } else {
                self.theme.bold()
            };
            let mut spans = vec![
                Span::styled(marker, self.theme.focused_border()),
                Span::styled(format!("{:<16}", field.label()), label_style),
            ];
            spans.extend(self.value_spans(field, value_width));
            lines.push(Line::from(spans));
        }

        lines.push(Line::from(""));
        if self.fallback {
            lines.push(Line::from(Span::styled(
                "  Backend unreachable, showing default models",
                self.theme.warning_style(),
            )));
        } else {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            "  Up/Down select  Left/Right change  Enter edit/toggle  Esc close",
            self.theme.muted_style(),
        )));

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(self.theme.focused_border())
                .title(" Settings "),
        );
        frame.render_widget(paragraph, area);
    }

    fn value_spans(&self, field: SettingsField, width: usize) -> Vec<Span<'static>> {
        let s = self.settings;
        match field {
            SettingsField::Model => {
                let size = self
                    .models
                    .iter()
                    .find(|m| m.name == s.model)
                    .and_then(|m| m.size.as_ref())
                    .map(|size| format!(" ({})", size))
                    .unwrap_or_default();
                vec![Span::raw(truncate(&format!("< {}{} >", s.model, size), width))]
            }
            SettingsField::Temperature => vec![
                Span::raw(format!("{:.1} ", s.temperature)),
                Span::styled(
                    slider(s.temperature, TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1, 20),
                    self.theme.muted_style(),
                ),
            ],
            SettingsField::MaxTokens => vec![
                Span::raw(format!("{} ", s.max_tokens)),
                Span::styled(
                    slider(
                        f64::from(s.max_tokens),
                        f64::from(MAX_TOKENS_RANGE.0),
                        f64::from(MAX_TOKENS_RANGE.1),
                        20,
                    ),
                    self.theme.muted_style(),
                ),
            ],
            SettingsField::SystemPrompt => {
                let prompt = s.system_prompt.replace('\n', " ");
                vec![Span::raw(truncate(&prompt, width))]
            }
            SettingsField::KnowledgeBase => vec![self.toggle(s.use_knowledge_base)],
            SettingsField::MongoTools => vec![self.toggle(s.use_mongodb_tools)],
        }
    }

    fn toggle(&self, on: bool) -> Span<'static> {
        if on {
            Span::styled("[x] on", self.theme.success_style())
        } else {
            Span::styled("[ ] off", self.theme.muted_style())
        }
    }
}

fn slider(value: f64, min: f64, max: f64, width: usize) -> String {
    let ratio = if max > min {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    format!("[{}{}]", "=".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn test_field_cycle() {
        assert_eq!(SettingsField::Model.prev(), SettingsField::MongoTools);
        assert_eq!(SettingsField::MongoTools.next(), SettingsField::Model);
        assert_eq!(SettingsField::Temperature.next(), SettingsField::MaxTokens);
    }

    #[test]
    fn test_slider() {
        assert_eq!(slider(0.0, 0.0, 2.0, 4), "[----]");
        assert_eq!(slider(1.0, 0.0, 2.0, 4), "[==--]");
        assert_eq!(slider(5.0, 0.0, 2.0, 4), "[====]");
    }

    #[test]
    fn test_renders_values() {
        let settings = ChatSettings {
            use_knowledge_base: true,
            ..ChatSettings::default()
        };
        let models = ModelInfo::fallback_list();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|frame| {
                SettingsPanel::new(&settings, &models)
                    .fallback(true)
                    .selected(SettingsField::Temperature)
                    .render(frame)
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        let screen: String = (0..buffer.area.height)
            .flat_map(|y| (0..buffer.area.width).map(move |x| (x, y)))
            .map(|pos| buffer[pos].symbol().to_string())
            .collect();
        assert!(screen.contains("< llama3.2 >"));
        assert!(screen.contains("▸ Temperature"));
        assert!(screen.contains("0.7"));
        assert!(screen.contains("[x] on"));
        assert!(screen.contains("default models"));
    }
}
