// Public modules
pub mod chat;
pub mod config;
pub mod error;
pub mod extract;
pub mod generation;
pub mod observability;
pub mod server;
pub mod types;

// Re-exports
pub use config::{ServerArgs, ServerConfig};
pub use error::{Error, Result};
pub use extract::{EXTRACTION_ORDER, ExtractionPath, extract_text};
pub use generation::{GeminiClient, Generator, UnconfiguredGenerator, generator_from_config};
pub use observability::{init_tracing, register_biometrics};
pub use server::{RelayState, SharedState, build_app, build_router, relay};
pub use types::*;
