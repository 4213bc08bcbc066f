//! Configuration types for the chat client.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the client runs with.

use std::time::Duration;

use arrrg_derive::CommandLine;
use url::Url;

use crate::chat::lifecycle::{CHAT_PATH, REQUEST_TIMEOUT};
use crate::error::Result;

/// Default origin of the relay.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Command-line arguments for the chatrelay-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Origin the relay is served from.
    #[arrrg(optional, "Relay origin (default: http://localhost:3000)", "URL")]
    pub origin: Option<String>,

    /// Request deadline in milliseconds.
    #[arrrg(optional, "Request timeout in milliseconds (default: 30000)", "MS")]
    pub timeout_ms: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Origin the relay is served from.
    pub origin: String,

    /// How long a request may take before it is abandoned.
    pub timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Origin: http://localhost:3000
    /// - Timeout: 30 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            timeout: REQUEST_TIMEOUT,
            use_color: true,
        }
    }

    /// Sets the relay origin.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Sets the request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// The chat endpoint: the origin joined with `/api/chat`.
    pub fn endpoint(&self) -> Result<Url> {
        Ok(Url::parse(&self.origin)?.join(CHAT_PATH)?)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            origin: args.origin.unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
            timeout: args
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(REQUEST_TIMEOUT),
            use_color: !args.no_color,
        }
    }
}
