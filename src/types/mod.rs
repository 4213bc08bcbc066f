// Public modules
pub mod chat_message;
pub mod chat_reply;
pub mod chat_request;
pub mod content;
pub mod role;

// Re-exports
pub use chat_message::ChatMessage;
pub use chat_reply::{ChatReply, ErrorReply};
pub use chat_request::ChatRequest;
pub use content::{Content, GenerateContentRequest, Part};
pub use role::Role;
