//! # LibrarySphere Main Application Entry Point
//!
//! This is the main executable for the LibrarySphere admin front-end.
//! It handles command-line argument parsing, tracing initialization,
//! server startup, and application lifecycle management.
//!
//! The application can be launched with optional command-line arguments:
//!
//! - First argument: Port number (defaults to 3000)
//! - Second argument: Path to configuration file (defaults to "config.json5")
//!
//! ## Example Usage
//!
//! ```bash
//! # Run with default settings (port 3000, default config)
//! cargo run
//!
//! # Run on a specific port
//! cargo run 8080
//!
//! # Run with a specific port and configuration file
//! cargo run 8080 my-config.json5
//! ```
//!
//! Log levels can be controlled through the `RUST_LOG` environment variable.

use library_sphere::{error::SphereError, server};
use std::env;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main entry point for the LibrarySphere application
///
/// Initializes logging, reads the port and configuration path from the command
/// line, and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the server cannot bind
#[tokio::main]
async fn main() -> Result<(), SphereError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000);

    let config_file_path = env::args().nth(2).map(PathBuf::from);

    tracing::info!("Starting LibrarySphere front-end");

    let cancel_token = CancellationToken::new();
    server::run(port, config_file_path, cancel_token).await?;

    tracing::info!("LibrarySphere front-end shutting down");
    Ok(())
}
