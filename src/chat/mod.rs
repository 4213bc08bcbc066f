//! The chat timeline client.
//!
//! # Architecture
//!
//! - [`timeline`]: grouped, in-memory conversation history
//! - [`lifecycle`]: one request to the relay, bounded by a deadline
//! - [`controller`]: the Idle/AwaitingResponse input state machine
//! - [`render`]: terminal output
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing

pub mod commands;
pub mod config;
pub mod controller;
pub mod lifecycle;
pub mod render;
pub mod timeline;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_ORIGIN};
pub use controller::{
    ChatSession, ControllerState, EMPTY_REPLY, InputController, InputSurface,
    SERVER_ERROR_REPLY, TIMEOUT_REPLY, reply_text,
};
pub use lifecycle::{
    CHAT_PATH, ChatTransport, ErrorKind, HttpTransport, PendingRequest, REQUEST_TIMEOUT,
    RequestLifecycle, SendError, TransportError, TransportResponse, interpret,
};
pub use render::{TerminalSurface, format_time};
pub use timeline::{
    AppendOptions, GROUPING_WINDOW, Message, MessageGroup, MessageRef, PLACEHOLDER_TEXT,
    TimelineStore,
};
