//! Structured JSON logger
//!
//! - One log line = one event
//! - `event` first, `severity` second, then fields sorted by key
//! - Synchronous, no buffering
//! - INFO/WARN go to stdout, ERROR/FATAL to stderr, unless
//!   `Logger::redirect_to_stderr` was called

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// When set, every line goes to stderr so stdout stays clean for command output
static ALL_TO_STDERR: AtomicBool = AtomicBool::new(false);

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Normal operations
    Info = 0,
    /// Recoverable issues
    Warn = 1,
    /// Operation failures
    Error = 2,
    /// Unrecoverable, process exits
    Fatal = 3,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn goes_to_stderr(&self) -> bool {
        *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger that outputs one JSON object per line
pub struct Logger;

impl Logger {
    /// Send all further log lines to stderr
    ///
    /// Used by one-shot commands whose stdout is machine-readable.
    pub fn redirect_to_stderr() {
        ALL_TO_STDERR.store(true, Ordering::Relaxed);
    }

    /// Log an event, routed to stdout or stderr by severity
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let line = render(severity, event, fields);
        if severity.goes_to_stderr() || ALL_TO_STDERR.load(Ordering::Relaxed) {
            Self::emit(&line, &mut io::stderr().lock());
        } else {
            Self::emit(&line, &mut io::stdout().lock());
        }
    }

    fn emit<W: Write>(line: &str, writer: &mut W) {
        // Logging never fails the caller
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }
}

/// Render a single log line, newline included
pub(crate) fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(128);

    output.push_str("{\"event\":");
    push_json_str(&mut output, event);
    output.push_str(",\"severity\":\"");
    output.push_str(severity.as_str());
    output.push('"');

    let mut sorted: Vec<_> = fields.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);

    for (key, value) in sorted {
        output.push(',');
        push_json_str(&mut output, key);
        output.push(':');
        push_json_str(&mut output, value);
    }

    output.push_str("}\n");
    output
}

fn push_json_str(output: &mut String, s: &str) {
    // Serializing a &str cannot fail
    match serde_json::to_string(s) {
        Ok(quoted) => output.push_str(&quoted),
        Err(_) => output.push_str("\"\""),
    }
}
