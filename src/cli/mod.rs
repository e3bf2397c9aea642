//! CLI module for rolesd
//!
//! Provides command-line interface for:
//! - serve: Open the document store and run the HTTP server
//! - get: Print the current document
//! - put: Replace the document from stdin

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, StoreArgs};
pub use commands::{get, put, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
