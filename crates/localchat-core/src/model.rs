//! Wire types exchanged with the chat backend.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chat::Message;
use crate::settings::ChatSettings;

/// Models offered when the backend cannot list its own.
pub const FALLBACK_MODELS: [&str; 3] = ["llama3.2", "mistral", "phi3:mini"];

/// Size of a model as reported by the backend.
///
/// The backend relays the model server's byte count, but older builds send
/// a preformatted label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelSize {
    Bytes(u64),
    Label(String),
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSize::Label(label) => write!(f, "{}", label),
            ModelSize::Bytes(bytes) => {
                const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
                let mut value = *bytes as f64;
                let mut unit = 0;
                while value >= 1024.0 && unit < UNITS.len() - 1 {
                    value /= 1024.0;
                    unit += 1;
                }
                if unit == 0 {
                    write!(f, "{} B", bytes)
                } else {
                    write!(f, "{:.1} {}", value, UNITS[unit])
                }
            }
        }
    }
}

/// A model available on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ModelSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

impl ModelInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            modified_at: None,
        }
    }

    /// Static model list used when fetching fails.
    pub fn fallback_list() -> Vec<ModelInfo> {
        FALLBACK_MODELS.iter().map(|name| ModelInfo::named(*name)).collect()
    }
}

/// Response body of `GET /models`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// Request body for `POST /chat` and `POST /chat/stream`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub use_knowledge_base: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub use_mongodb_tools: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ChatRequest {
    /// Build a request for `messages` using the current settings.
    pub fn from_settings(messages: Vec<Message>, settings: &ChatSettings) -> Self {
        Self {
            messages,
            model: settings.model.clone(),
            temperature: Some(settings.temperature),
            max_tokens: Some(settings.max_tokens),
            system_prompt: Some(settings.system_prompt.clone()),
            use_knowledge_base: settings.use_knowledge_base,
            use_mongodb_tools: settings.use_mongodb_tools,
        }
    }
}

/// Response body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub model: String,
}

/// Response body of `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Acknowledgement returned after a document upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl fmt::Display for IngestReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, self.chunks) {
            (Some(message), _) => write!(f, "{}", message),
            (None, Some(chunks)) => write!(f, "Indexed {} chunks", chunks),
            (None, None) => write!(f, "Document uploaded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_size_accepts_bytes_and_labels() {
        let list: ModelList = serde_json::from_str(
            r#"{"models":[{"name":"a","size":2147483648},{"name":"b","size":"4 GB"},{"name":"c"}]}"#,
        )
        .unwrap();
        assert_eq!(list.models[0].size, Some(ModelSize::Bytes(2_147_483_648)));
        assert_eq!(list.models[0].size.as_ref().unwrap().to_string(), "2.0 GB");
        assert_eq!(list.models[1].size.as_ref().unwrap().to_string(), "4 GB");
        assert!(list.models[2].size.is_none());
    }

    #[test]
    fn test_small_sizes_render_in_bytes() {
        assert_eq!(ModelSize::Bytes(512).to_string(), "512 B");
        assert_eq!(ModelSize::Bytes(1536).to_string(), "1.5 KB");
    }

    #[test]
    fn test_missing_models_field_is_empty() {
        let list: ModelList = serde_json::from_str("{}").unwrap();
        assert!(list.models.is_empty());
    }

    #[test]
    fn test_request_omits_unset_flags() {
        let settings = ChatSettings::default();
        let request = ChatRequest::from_settings(vec![Message::user("hi")], &settings);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["max_tokens"], 2048);
        assert!(json.get("use_knowledge_base").is_none());

        let settings = ChatSettings {
            use_knowledge_base: true,
            ..ChatSettings::default()
        };
        let request = ChatRequest::from_settings(vec![], &settings);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["use_knowledge_base"], true);
        assert!(json.get("use_mongodb_tools").is_none());
    }

    #[test]
    fn test_fallback_models() {
        let names: Vec<_> = ModelInfo::fallback_list().into_iter().map(|m| m.name).collect();
        assert_eq!(names, ["llama3.2", "mistral", "phi3:mini"]);
    }
}
