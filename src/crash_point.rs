//! Crash point injection for testing durability
//!
//! Crash points are enabled through the `ROLESD_CRASH_POINT` environment
//! variable. When the named point is reached the process terminates via
//! `std::process::abort()`: no cleanup, no unwinding, no catching.
//!
//! # Usage
//!
//! ```ignore
//! use rolesd::crash_point::{maybe_crash, points};
//!
//! maybe_crash(points::DOCUMENT_AFTER_TEMP_WRITE);
//! ```
//!
//! # Testing
//!
//! ```bash
//! ROLESD_CRASH_POINT=document_after_temp_write rolesd put < roles.json
//! ```
//!
//! Fault points are the non-fatal sibling: `ROLESD_FAULT_POINT` names a
//! point where `maybe_fail` returns an injected I/O error instead.

use std::io;
use std::sync::OnceLock;

/// Environment variable holding the active crash point
pub const CRASH_POINT_ENV: &str = "ROLESD_CRASH_POINT";

/// Cache the crash point name to avoid repeated env var lookups
static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Check if a specific crash point is enabled
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Abort the process if the named crash point is enabled
///
/// No-op when `ROLESD_CRASH_POINT` is unset or names another point.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// Environment variable holding the active fault point
pub const FAULT_POINT_ENV: &str = "ROLESD_FAULT_POINT";

static FAULT_POINT: OnceLock<Option<String>> = OnceLock::new();

/// Check if a specific fault point is enabled
#[inline]
pub fn fault_point_enabled(name: &str) -> bool {
    FAULT_POINT
        .get_or_init(|| std::env::var(FAULT_POINT_ENV).ok())
        .as_deref()
        == Some(name)
}

/// Return an injected I/O error if the named fault point is enabled
#[inline]
pub fn maybe_fail(name: &str) -> io::Result<()> {
    if fault_point_enabled(name) {
        eprintln!("[FAULT] Injecting I/O error at point: {}", name);
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("injected fault at {}", name),
        ));
    }
    Ok(())
}

/// All defined crash point names
pub mod points {
    /// Before any byte of the replacement reaches the temp file
    pub const DOCUMENT_BEFORE_TEMP_WRITE: &str = "document_before_temp_write";
    /// Temp file written and fsynced, canonical file untouched
    pub const DOCUMENT_AFTER_TEMP_WRITE: &str = "document_after_temp_write";
    /// Rename done, in-memory document not yet published
    pub const DOCUMENT_AFTER_RENAME: &str = "document_after_rename";

    /// Get all crash point names
    pub fn all() -> &'static [&'static str] {
        &[
            DOCUMENT_BEFORE_TEMP_WRITE,
            DOCUMENT_AFTER_TEMP_WRITE,
            DOCUMENT_AFTER_RENAME,
        ]
    }
}

/// All defined fault point names
pub mod faults {
    /// Directory fsync right after the rename
    pub const DOCUMENT_DIR_SYNC: &str = "document_dir_sync";

    pub fn all() -> &'static [&'static str] {
        &[DOCUMENT_DIR_SYNC]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crash_point_disabled_by_default() {
        assert!(!crash_point_enabled("test_point"));
    }

    #[test]
    fn test_fault_point_disabled_by_default() {
        assert!(!fault_point_enabled("test_point"));
        assert!(maybe_fail("test_point").is_ok());
    }

    #[test]
    fn test_all_crash_points_defined() {
        let all = points::all();
        assert_eq!(all.len(), 3);
        assert!(all.contains(&"document_after_temp_write"));
    }

    #[test]
    fn test_crash_point_names_are_lowercase_with_underscores() {
        for point in points::all().iter().chain(faults::all()) {
            assert!(
                point.chars().all(|c| c.is_lowercase() || c == '_'),
                "Crash point '{}' should be lowercase with underscores",
                point
            );
        }
    }
}
