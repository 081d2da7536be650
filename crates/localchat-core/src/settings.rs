//! Persisted chat settings.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);
pub const TEMPERATURE_STEP: f64 = 0.1;
pub const MAX_TOKENS_RANGE: (u32, u32) = (1, 4096);
pub const MAX_TOKENS_STEP: u32 = 256;

/// Generation settings sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_prompt: String,
    #[serde(default)]
    pub use_knowledge_base: bool,
    #[serde(default)]
    pub use_mongodb_tools: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            use_knowledge_base: false,
            use_mongodb_tools: false,
        }
    }
}

impl ChatSettings {
    /// Move the temperature by `steps` increments of 0.1, clamped to 0..=2.
    pub fn step_temperature(&mut self, steps: i32) {
        let raw = self.temperature + f64::from(steps) * TEMPERATURE_STEP;
        let rounded = (raw * 10.0).round() / 10.0;
        self.temperature = rounded.clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1);
    }

    /// Move max tokens by `steps` increments of 256, clamped to 1..=4096.
    pub fn step_max_tokens(&mut self, steps: i32) {
        let raw = i64::from(self.max_tokens) + i64::from(steps) * i64::from(MAX_TOKENS_STEP);
        let clamped = raw.clamp(i64::from(MAX_TOKENS_RANGE.0), i64::from(MAX_TOKENS_RANGE.1));
        self.max_tokens = clamped as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ChatSettings::default();
        assert_eq!(settings.model, "llama3.2");
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.max_tokens, 2048);
        assert!(!settings.use_knowledge_base);
    }

    #[test]
    fn test_temperature_steps_and_clamps() {
        let mut settings = ChatSettings::default();
        settings.step_temperature(1);
        assert_eq!(settings.temperature, 0.8);
        settings.step_temperature(50);
        assert_eq!(settings.temperature, 2.0);
        settings.step_temperature(-100);
        assert_eq!(settings.temperature, 0.0);
    }

    #[test]
    fn test_max_tokens_steps_and_clamps() {
        let mut settings = ChatSettings::default();
        settings.step_max_tokens(1);
        assert_eq!(settings.max_tokens, 2304);
        settings.step_max_tokens(20);
        assert_eq!(settings.max_tokens, 4096);
        settings.step_max_tokens(-100);
        assert_eq!(settings.max_tokens, 1);
    }

    #[test]
    fn test_missing_flags_default_to_false() {
        let json = r#"{"model":"m","temperature":0.5,"max_tokens":10,"system_prompt":"s"}"#;
        let settings: ChatSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.max_tokens, 10);
        assert!(!settings.use_mongodb_tools);
    }
}
