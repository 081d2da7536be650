//! UI components for the LocalChat browser client.

mod chat_window;
mod code_block;
mod conversation_list;
mod knowledge_base;
mod message_input;
mod message_item;
mod message_list;
mod model_selector;

pub use chat_window::ChatWindow;
pub use code_block::CodeBlock;
pub use conversation_list::ConversationList;
pub use knowledge_base::KnowledgeBaseView;
pub use message_input::MessageInput;
pub use message_item::MessageItem;
pub use message_list::MessageList;
pub use model_selector::ModelSelector;
