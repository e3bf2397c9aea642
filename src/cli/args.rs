//! CLI argument definitions using clap
//!
//! Commands:
//! - rolesd serve [--config <path>] [--roles-file <path>] [--port <port>]
//! - rolesd get [--config <path>] [--roles-file <path>]
//! - rolesd put [--config <path>] [--roles-file <path>] < document.json

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// rolesd - serve and update a roles/permissions JSON document
#[derive(Parser, Debug)]
#[command(name = "rolesd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command that opens the document store
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the document path from the configuration
    #[arg(long)]
    pub roles_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        #[command(flatten)]
        store: StoreArgs,

        /// Override the listen port from the configuration
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the current document
    Get {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Replace the document with JSON read from stdin
    Put {
        #[command(flatten)]
        store: StoreArgs,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_with_overrides() {
        let cli = Cli::parse_from(["rolesd", "serve", "--port", "9000", "--roles-file", "r.json"]);
        match cli.command {
            Command::Serve { store, port } => {
                assert_eq!(port, Some(9000));
                assert_eq!(store.roles_file, Some(PathBuf::from("r.json")));
                assert!(store.config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_put_takes_config() {
        let cli = Cli::parse_from(["rolesd", "put", "--config", "rolesd.json"]);
        assert!(matches!(
            cli.command,
            Command::Put { store: StoreArgs { config: Some(_), .. } }
        ));
    }
}
