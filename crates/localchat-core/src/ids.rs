//! Newtype wrapper for conversation identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a Conversation.
///
/// Identifiers are derived from the creation time in epoch milliseconds,
/// which keeps them sortable and compatible with previously exported data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Create a new ConversationId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build an id from an epoch-millisecond value.
    pub fn from_millis(millis: i64) -> Self {
        Self(millis.to_string())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_millis() {
        let id = ConversationId::from_millis(1_700_000_000_123);
        assert_eq!(id.as_str(), "1700000000123");
    }

    #[test]
    fn test_id_display() {
        let id = ConversationId::new("conv-123");
        assert_eq!(format!("{}", id), "conv-123");
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ConversationId::from("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }
}
