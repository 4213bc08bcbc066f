use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// A single text part of a generation content entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    /// The text of this part.
    pub text: String,
}

/// One conversation turn in the shape the generation API expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Content {
    /// Role of the turn's author.
    pub role: String,

    /// Ordered parts making up the turn.
    pub parts: Vec<Part>,
}

impl From<&ChatMessage> for Content {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.clone(),
            parts: vec![Part {
                text: message.content.clone(),
            }],
        }
    }
}

/// Body of a `generateContent` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateContentRequest {
    /// The conversation so far.
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Build a request from relay chat messages, preserving their order.
    pub fn from_messages(messages: &[ChatMessage]) -> Self {
        Self {
            contents: messages.iter().map(Content::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn messages_become_single_part_contents() {
        let request = GenerateContentRequest::from_messages(&[
            ChatMessage::user("Hello"),
            ChatMessage::new("model", "Hi"),
        ]);
        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "Hello"}]},
                    {"role": "model", "parts": [{"text": "Hi"}]}
                ]
            })
        );
    }
}
