//! Observable lifecycle events for rolesd
//!
//! Events are explicit and typed. Each event carries a fixed severity so
//! callers never pick one ad hoc.

use std::fmt;

use super::Severity;

/// Observable events in rolesd
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Process startup begins
    BootStart,
    /// Store open, ready to serve
    BootComplete,
    /// Boot could not complete (FATAL)
    BootFailed,
    /// Shutdown initiated
    ShutdownStart,
    /// Shutdown complete
    ShutdownComplete,

    // Configuration
    /// Configuration loaded and validated
    ConfigLoaded,

    // Document load
    /// Document file parsed at open
    DocumentLoaded,
    /// No document file; default document in use
    DocumentMissing,
    /// Document file present but unparseable; default document in use
    DocumentUnreadable,
    /// Leftover temp file from an interrupted replace was removed
    StaleTempRemoved,

    // Replace
    /// Replace durably committed and published
    ReplaceCommit,
    /// Replace rejected before any disk write
    ReplaceRejected,
    /// Replace failed while persisting
    ReplaceFailed,
    /// Replace committed but the directory fsync after the rename failed
    DirSyncFailed,

    // Server
    /// HTTP listener bound and serving
    Serving,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "ROLESD_STARTUP_BEGIN",
            Event::BootComplete => "ROLESD_STARTUP_COMPLETE",
            Event::BootFailed => "ROLESD_STARTUP_FAILED",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::DocumentLoaded => "DOCUMENT_LOADED",
            Event::DocumentMissing => "DOCUMENT_MISSING",
            Event::DocumentUnreadable => "DOCUMENT_UNREADABLE",
            Event::StaleTempRemoved => "DOCUMENT_STALE_TEMP_REMOVED",

            Event::ReplaceCommit => "REPLACE_COMMIT",
            Event::ReplaceRejected => "REPLACE_REJECTED",
            Event::ReplaceFailed => "REPLACE_FAILED",
            Event::DirSyncFailed => "DOCUMENT_DIR_SYNC_FAILED",

            Event::Serving => "ROLESD_SERVING",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::BootFailed => Severity::Fatal,
            Event::ReplaceFailed => Severity::Error,
            Event::DocumentUnreadable
            | Event::ReplaceRejected
            | Event::StaleTempRemoved
            | Event::DirSyncFailed => Severity::Warn,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Event; 15] = [
        Event::BootStart,
        Event::BootComplete,
        Event::BootFailed,
        Event::ShutdownStart,
        Event::ShutdownComplete,
        Event::ConfigLoaded,
        Event::DocumentLoaded,
        Event::DocumentMissing,
        Event::DocumentUnreadable,
        Event::StaleTempRemoved,
        Event::ReplaceCommit,
        Event::ReplaceRejected,
        Event::ReplaceFailed,
        Event::DirSyncFailed,
        Event::Serving,
    ];

    #[test]
    fn test_all_events_have_string_representation() {
        for event in ALL {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_only_boot_failure_is_fatal() {
        let fatal: Vec<_> = ALL.iter().filter(|e| e.is_fatal()).collect();
        assert_eq!(fatal, vec![&Event::BootFailed]);
    }

    #[test]
    fn test_replace_failure_is_error() {
        assert_eq!(Event::ReplaceFailed.severity(), Severity::Error);
        assert_eq!(Event::ReplaceRejected.severity(), Severity::Warn);
        assert_eq!(Event::ReplaceCommit.severity(), Severity::Info);
        assert_eq!(Event::DirSyncFailed.severity(), Severity::Warn);
    }
}
