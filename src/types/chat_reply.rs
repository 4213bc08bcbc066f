use serde::{Deserialize, Serialize};

/// Success body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatReply {
    /// Text extracted from the generation reply.
    pub result: String,
}

/// Failure body returned by every relay endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorReply {
    /// Human-readable description of what went wrong.
    pub error: String,
}

impl ErrorReply {
    /// Create a new `ErrorReply`.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
