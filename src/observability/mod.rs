//! Observability for rolesd
//!
//! Structured JSON logging plus a typed set of lifecycle events.
//!
//! ```ignore
//! use rolesd::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ReplaceCommit, &[("version", "4")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::BootStart);
        log_event(Event::BootComplete);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ConfigLoaded, &[("roles_file", "/tmp/roles.json")]);
    }
}
