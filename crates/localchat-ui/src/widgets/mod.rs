//! Reusable TUI widgets.

pub mod conversation_list;
pub mod dialogs;
pub mod footer;
pub mod header;
pub mod input;
pub mod markdown;
pub mod message_list;
pub mod settings;
