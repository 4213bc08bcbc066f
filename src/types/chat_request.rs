use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The conversation to forward.  The relay is stateless, so the client decides
    /// how much history to send; the chat client sends exactly one user message.
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Create a request carrying a single user message.
    pub fn single_user(text: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(text)],
        }
    }
}
