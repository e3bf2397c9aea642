//! JSON I/O for one-shot commands
//!
//! - Input: one JSON document on stdin (any layout, read to EOF)
//! - Output: one JSON object per line on stdout

use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read the whole of stdin
pub fn read_document() -> CliResult<Vec<u8>> {
    let mut buffer = Vec::new();
    io::stdin().lock().read_to_end(&mut buffer)?;

    if buffer.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(CliError::io_error("Empty input"));
    }

    Ok(buffer)
}

/// Write a success envelope to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_json(&serde_json::json!({
        "status": "ok",
        "data": data
    }))
}

/// Write a JSON value as a single line to stdout
pub fn write_json(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
