//! The chat relay backend.
//!
//! Serves `POST /api/chat`, the ping and debug endpoints, and the static frontend.
//!
//! # Usage
//!
//! ```bash
//! # GEMINI_API_KEY may also come from a .env file
//! GEMINI_API_KEY=... chatrelay-server
//!
//! # Listen elsewhere; PORT still overrides the port
//! chatrelay-server --bind 0.0.0.0:8080 --public-dir ./public
//! ```

use arrrg::CommandLine;
use biometrics::Collector;
use tracing::{error, info, warn};

use chatrelay::{
    RelayState, ServerArgs, ServerConfig, build_app, generator_from_config, init_tracing,
    register_biometrics,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();
    register_biometrics(Collector::new());

    let (args, _) = ServerArgs::from_command_line_relaxed("chatrelay-server [OPTIONS]");
    let config = ServerConfig::from_args(args)?;
    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; chat requests will fail until it is");
    }

    let generator = generator_from_config(&config)?;
    let state = RelayState::new(generator, config.api_key.is_some());
    let app = build_app(state, &config.public_dir);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        addr = %config.bind,
        model = %config.model,
        public_dir = %config.public_dir.display(),
        version = env!("CARGO_PKG_VERSION"),
        "chatrelay-server listening"
    );

    let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("ctrl-c received; shutting down");
    });
    if let Err(e) = graceful.await {
        error!(error = %e, "server error");
    }

    Ok(())
}
