//! CLI command implementations
//!
//! Every command resolves configuration, opens the document store, then
//! does its one job. `serve` blocks until Ctrl-C.

use std::sync::Arc;

use serde_json::json;

use super::args::{Command, StoreArgs};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_document, write_json, write_response};
use crate::document::DocumentStore;
use crate::http_server::HttpServer;
use crate::observability::{log_event, log_event_with_fields, Event, Logger};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { store, port } => serve(&store, port),
        Command::Get { store } => {
            Logger::redirect_to_stderr();
            get(&store)
        }
        Command::Put { store } => {
            Logger::redirect_to_stderr();
            put(&store)
        }
    }
}

/// Open the store and run the HTTP server until Ctrl-C
pub fn serve(args: &StoreArgs, port: Option<u16>) -> CliResult<()> {
    log_event(Event::BootStart);

    let mut config = Config::resolve(args)?;
    if let Some(port) = port {
        config.http.port = port;
        config.validate()?;
    }

    let store = open_store(&config)?;
    log_event_with_fields(Event::BootComplete, &[("origin", store.origin().as_str())]);

    let server = HttpServer::new(config.http_config(), Arc::new(store));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Print the current document as one JSON line
pub fn get(args: &StoreArgs) -> CliResult<()> {
    let config = Config::resolve(args)?;
    let store = open_store(&config)?;

    write_json(store.read().content())
}

/// Replace the document with JSON from stdin
pub fn put(args: &StoreArgs) -> CliResult<()> {
    let config = Config::resolve(args)?;
    let store = open_store(&config)?;

    let body = read_document()?;
    let version = store.replace(&body)?;

    write_response(json!({ "version": version }))
}

fn open_store(config: &Config) -> CliResult<DocumentStore> {
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("roles_file", &config.roles_file.display().to_string()),
            ("strict_load", if config.strict_load { "true" } else { "false" }),
        ],
    );

    DocumentStore::open(&config.roles_file, config.load_policy()).map_err(|e| {
        log_event_with_fields(Event::BootFailed, &[("error", &e.to_string())]);
        CliError::boot_failed(format!("Failed to open document store: {}", e))
    })
}
