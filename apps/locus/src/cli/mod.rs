//! # Locus CLI Module
//!
//! This module implements the CLI interface for Locus.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show store and engine status
//! - `search` - Find an object in the map
//! - `localize` - Localize an image
//! - `navigate` - Search, localize and print directions

mod commands;

use crate::config::LocusConfig;
use clap::{Parser, Subcommand};
use locus_core::LocusError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Locus - find objects in a mapped space and walk to them
///
/// Searches annotated map frames, localizes a photo against the map with an
/// external recognition engine and turns the result into clock-face
/// directions.
#[derive(Parser, Debug)]
#[command(name = "locus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the map store (overrides config and LOCUS_DATABASE)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Recognition engine program (overrides config and LOCUS_ENGINE)
    #[arg(short = 'E', long, global = true)]
    pub engine: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show store and engine status
    Status,

    /// Find an object in the map
    Search {
        /// Object to look for, e.g. "2% milk"
        query: String,
    },

    /// Localize an image against the map
    Localize {
        /// Query image
        image: PathBuf,
    },

    /// Search, localize and print directions to the nearest match
    Navigate {
        /// Object to look for
        query: String,

        /// Image taken from where the user stands
        image: PathBuf,

        /// Include stage timings
        #[arg(short, long)]
        timing: bool,
    },
}

impl Cli {
    /// Configuration file, then environment, then command-line flags.
    pub fn resolve_config(&self) -> Result<LocusConfig, LocusError> {
        let mut config = LocusConfig::load(self.config.as_deref())?;
        if let Some(database) = &self.database {
            config.store.path.clone_from(database);
        }
        if let Some(engine) = &self.engine {
            config.engine.program.clone_from(engine);
        }
        if let Some(Commands::Server { host, port }) = &self.command {
            if let Some(host) = host {
                config.server.host.clone_from(host);
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
        }
        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), LocusError> {
    let config = cli.resolve_config()?;
    let json_mode = cli.json_mode;
    let verbose = cli.verbose;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&config).await,
        Some(Commands::Status) | None => cmd_status(&config, json_mode),
        Some(Commands::Search { query }) => cmd_search(&config, &query, json_mode, verbose),
        Some(Commands::Localize { image }) => cmd_localize(&config, &image, json_mode).await,
        Some(Commands::Navigate {
            query,
            image,
            timing,
        }) => cmd_navigate(&config, &query, &image, timing, json_mode).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "locus",
            "--database",
            "/maps/store.db",
            "--engine",
            "/opt/engine",
            "server",
            "--port",
            "9090",
        ]);
        let config = cli.resolve_config().expect("config");
        assert_eq!(config.store.path, PathBuf::from("/maps/store.db"));
        assert_eq!(config.engine.program, PathBuf::from("/opt/engine"));
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn navigate_arguments() {
        let cli = Cli::parse_from(["locus", "navigate", "2% milk", "query.jpg", "--timing"]);
        let Some(Commands::Navigate {
            query,
            image,
            timing,
        }) = cli.command
        else {
            unreachable!("navigate parses as Navigate");
        };
        assert_eq!(query, "2% milk");
        assert_eq!(image, PathBuf::from("query.jpg"));
        assert!(timing);
    }
}
