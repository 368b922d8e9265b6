//! # Locus - Wayfinding Server
//!
//! The main binary for Locus.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for search, localization and navigation
//! - Single-flight management of the recognition engine process
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      apps/locus (THE BINARY)                    │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐    │
//! │  │   CLI       │    │   HTTP API  │    │   Coordinator    │    │
//! │  │  (clap)     │    │   (axum)    │    │ (engine process) │    │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘    │
//! │         │                  │                    │              │
//! │         └──────────── Workflow ─────────────────┘              │
//! │                            ▼                                   │
//! │                    ┌───────────────┐                           │
//! │                    │  locus-core   │                           │
//! │                    │ (THE LOGIC)   │                           │
//! │                    └───────────────┘                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! locus --database store.db server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! locus status
//! locus search "2% milk"
//! locus navigate "2% milk" photo.jpg --timing
//! ```

use clap::Parser;
use locus::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // LOCUS_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LOCUS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "locus=info,locus_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Locus startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗      ██████╗  ██████╗██╗   ██╗███████╗
  ██║     ██╔═══██╗██╔════╝██║   ██║██╔════╝
  ██║     ██║   ██║██║     ██║   ██║███████╗
  ██║     ██║   ██║██║     ██║   ██║╚════██║
  ███████╗╚██████╔╝╚██████╗╚██████╔╝███████║
  ╚══════╝ ╚═════╝  ╚═════╝ ╚═════╝ ╚══════╝

  Wayfinding Server v{}

  Search • Localize • Guide
"#,
        env!("CARGO_PKG_VERSION")
    );
}
