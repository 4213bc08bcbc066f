//! Configuration for the relay backend.
//!
//! Command-line arguments are parsed with `arrrg`; the API key and the port override
//! come from the environment (after `.env` is loaded by the server binary).

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use arrrg_derive::CommandLine;

use crate::error::{Error, Result};

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Default generation model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default base URL of the generation API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Default directory holding the static frontend.
pub const DEFAULT_PUBLIC_DIR: &str = "public";

/// Environment variable holding the generation API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the listen port.
pub const PORT_ENV: &str = "PORT";

/// Command-line arguments for the chatrelay-server tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ServerArgs {
    /// Address to listen on.
    #[arrrg(optional, "Listen address (default: 127.0.0.1:3000)", "ADDR")]
    pub bind: Option<String>,

    /// Generation model.
    #[arrrg(optional, "Generation model (default: gemini-2.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// Directory of static frontend files.
    #[arrrg(optional, "Static files directory (default: public)", "DIR")]
    pub public_dir: Option<String>,

    /// Base URL of the generation API.
    #[arrrg(optional, "Generation API base URL", "URL")]
    pub api_base: Option<String>,
}

/// Resolved configuration for the relay backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    pub bind: SocketAddr,

    /// Generation model name.
    pub model: String,

    /// Directory served as the static frontend.
    pub public_dir: PathBuf,

    /// Base URL of the generation API, ending in `/`.
    pub api_base: String,

    /// Generation API key, if one is configured.
    pub api_key: Option<String>,
}

impl ServerConfig {
    /// Resolve arguments against the process environment.
    pub fn from_args(args: ServerArgs) -> Result<Self> {
        Self::resolve(
            args,
            env::var(PORT_ENV).ok(),
            env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty()),
        )
    }

    /// Resolve arguments against explicit environment values.
    ///
    /// A `port` override replaces the port of the bind address.
    pub fn resolve(args: ServerArgs, port: Option<String>, api_key: Option<String>) -> Result<Self> {
        let bind = args.bind.as_deref().unwrap_or(DEFAULT_BIND);
        let mut bind: SocketAddr = bind.parse().map_err(|e| {
            Error::configuration(format!("invalid bind address {bind:?}: {e}"))
        })?;
        if let Some(port) = port {
            let port: u16 = port
                .parse()
                .map_err(|e| Error::configuration(format!("invalid {PORT_ENV} {port:?}: {e}")))?;
            bind.set_port(port);
        }
        let mut api_base = args
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        if !api_base.ends_with('/') {
            api_base.push('/');
        }
        Ok(Self {
            bind,
            model: args.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            public_dir: PathBuf::from(
                args.public_dir
                    .unwrap_or_else(|| DEFAULT_PUBLIC_DIR.to_string()),
            ),
            api_base,
            api_key,
        })
    }

    /// The API key, or a configuration error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::configuration(format!("{API_KEY_ENV} environment variable not set"))
        })
    }
}
