//! Terminal widgets for LocalChat.
//!
//! # Architecture
//!
//! The crate is organized into:
//! - `widgets` - ratatui widgets (message list, conversation list, input, settings, dialogs)
//! - `theme` - Colors, styles, and visual constants
//! - `utils` - Text wrapping, formatting utilities
//!
//! # Usage
//!
//! Widgets take plain views of the data they draw (`MessageView`,
//! `ConversationItem`, ...) rather than the application state, so the
//! terminal binary decides what to show and the widgets decide how.

pub mod theme;
pub mod utils;
pub mod widgets;

pub use theme::Theme;
pub use utils::{format_timestamp, truncate, wrap_text, wrap_text_indented};
pub use widgets::conversation_list::{ConversationItem, ConversationList};
pub use widgets::dialogs::{centered_rect, ConfirmDialog, InputDialog};
pub use widgets::footer::{Footer, StatusLevel};
pub use widgets::header::{Header, StatusIndicator};
pub use widgets::input::{InputBuffer, MessageInput};
pub use widgets::markdown::{render_markdown, RenderedMarkdown};
pub use widgets::message_list::{MessageList, MessageListState, MessageRole, MessageView};
pub use widgets::settings::{SettingsField, SettingsPanel};
