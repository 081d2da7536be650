//! LocalChat Core
//!
//! This crate contains the pieces shared by every LocalChat front end:
//! - Data model (messages, conversations, settings, backend payloads)
//! - Incremental decoding of the streaming chat endpoint
//! - Persistence adapter over a pluggable key-value store
//! - The chat session controller and the conversation manager
//!
//! Nothing here performs I/O on its own. Front ends feed network results
//! into the state machines and render from their accessors, so the same
//! code runs natively and in the browser.

pub mod chat;
pub mod conversation;
pub mod error;
pub mod ids;
pub mod manager;
pub mod markdown;
pub mod model;
pub mod session;
pub mod settings;
pub mod storage;
pub mod stream;

// Re-export commonly used types
pub use chat::{Message, Role};
pub use conversation::{derive_title, Conversation, DEFAULT_TITLE, TITLE_MAX_CHARS};
pub use error::{CoreError, SessionError, StorageError};
pub use ids::ConversationId;
pub use manager::ConversationManager;
pub use model::{ChatRequest, ChatResponse, HealthStatus, IngestReceipt, ModelInfo, ModelList, ModelSize};
pub use session::{ChatSession, SendMode, SendTicket};
pub use settings::ChatSettings;
pub use storage::{ChatStorage, KeyValueStore, MemoryStore, CONVERSATIONS_KEY, SETTINGS_KEY};
pub use stream::{Decoded, Framing, FragmentDecoder, Utf8Decoder};

pub use tokio_util::sync::CancellationToken;
