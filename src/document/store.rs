//! The document store
//!
//! Holds the committed document behind `RwLock<Arc<Document>>` and serializes
//! writers with a separate mutex. A replace runs parse → write temp → fsync →
//! rename → publish while holding the writer mutex. Publish is one pointer
//! swap under the read/write lock, so readers see either the old or the new
//! document and never wait on disk.
//!
//! An open store holds an exclusive lock on `<file>.lock`, so a second store
//! on the same file fails to open rather than racing the first.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde_json::{json, Value};

use super::errors::{DocumentError, DocumentResult};
use super::persist::{self, LoadOutcome, WriteOutcome};
use crate::observability::{log_event_with_fields, Event};

/// What to do when the file exists but does not parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Fall back to the default document and log a warning
    #[default]
    Forgiving,
    /// Refuse to open
    Strict,
}

/// How the document in memory at open was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOrigin {
    Loaded,
    Missing,
    Unreadable,
}

impl DocumentOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentOrigin::Loaded => "loaded",
            DocumentOrigin::Missing => "missing",
            DocumentOrigin::Unreadable => "unreadable",
        }
    }
}

/// A committed document and its version
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    content: Value,
    version: u64,
}

impl Document {
    /// The document served when no durable file exists: `{"roles":[]}`
    pub fn default_content() -> Value {
        json!({ "roles": [] })
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Number of replaces committed since the store was opened
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Single-document JSON store with atomic replace
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    origin: DocumentOrigin,
    current: RwLock<Arc<Document>>,
    writer: Mutex<()>,
    _lock_file: File,
}

impl DocumentStore {
    /// Open the store at `path`
    ///
    /// Fails with `StoreLocked` if another store has the file open. Temp
    /// files left by interrupted replaces are discarded once the lock is
    /// held; the canonical file is the only committed state.
    pub fn open(path: impl Into<PathBuf>, policy: LoadPolicy) -> DocumentResult<Self> {
        let path = path.into();
        let path_str = path.display().to_string();

        let lock_file = persist::lock_exclusive(&path)?;

        for temp in persist::remove_stale_temps(&path)? {
            log_event_with_fields(
                Event::StaleTempRemoved,
                &[("path", &path_str), ("temp", &temp.display().to_string())],
            );
        }

        let (content, origin) = match persist::load(&path)? {
            LoadOutcome::Loaded(value) => {
                log_event_with_fields(Event::DocumentLoaded, &[("path", &path_str)]);
                (value, DocumentOrigin::Loaded)
            }
            LoadOutcome::Missing => {
                log_event_with_fields(Event::DocumentMissing, &[("path", &path_str)]);
                (Document::default_content(), DocumentOrigin::Missing)
            }
            LoadOutcome::Unreadable(reason) => {
                if policy == LoadPolicy::Strict {
                    return Err(DocumentError::CorruptDocument {
                        path: path_str,
                        reason,
                    });
                }
                log_event_with_fields(
                    Event::DocumentUnreadable,
                    &[("path", &path_str), ("reason", &reason)],
                );
                (Document::default_content(), DocumentOrigin::Unreadable)
            }
        };

        Ok(Self {
            path,
            origin,
            current: RwLock::new(Arc::new(Document {
                content,
                version: 0,
            })),
            writer: Mutex::new(()),
            _lock_file: lock_file,
        })
    }

    /// Current committed document
    pub fn read(&self) -> Arc<Document> {
        // Publish is a single assignment, so a poisoned lock still holds a whole document
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Parse `bytes` as JSON and replace the document with it
    ///
    /// Returns the new version. Malformed input is rejected before any disk
    /// write.
    pub fn replace(&self, bytes: &[u8]) -> DocumentResult<u64> {
        let value = serde_json::from_slice::<Value>(bytes).map_err(|e| {
            let err = DocumentError::invalid(e);
            log_event_with_fields(Event::ReplaceRejected, &[("reason", &err.to_string())]);
            err
        })?;

        self.replace_value(value)
    }

    /// Replace the document with an already parsed value
    pub fn replace_value(&self, value: Value) -> DocumentResult<u64> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        // Only writers bump the version and we hold the writer lock
        let next = self.read().version + 1;

        let result = serde_json::to_vec_pretty(&value)
            .map_err(|e| {
                DocumentError::persistence(
                    "Failed to serialize document",
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                )
            })
            .and_then(|bytes| persist::write_atomic(&self.path, &bytes));

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                log_event_with_fields(Event::ReplaceFailed, &[("error", &e.to_string())]);
                return Err(e);
            }
        };

        // Past the rename the file holds the new document; memory must follow
        if let WriteOutcome::DirSyncFailed(e) = &outcome {
            log_event_with_fields(
                Event::DirSyncFailed,
                &[("error", &e.to_string()), ("version", &next.to_string())],
            );
        }

        self.publish(Document {
            content: value,
            version: next,
        });

        log_event_with_fields(
            Event::ReplaceCommit,
            &[("version", &next.to_string()), ("path", &self.path.display().to_string())],
        );

        Ok(next)
    }

    fn publish(&self, document: Document) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(document);
    }

    /// Path of the canonical document file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How the initial document was obtained
    pub fn origin(&self) -> DocumentOrigin {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn open_in(dir: &TempDir) -> DocumentStore {
        DocumentStore::open(dir.path().join("roles.json"), LoadPolicy::Forgiving).unwrap()
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir);

        let doc = store.read();
        assert_eq!(doc.content(), &json!({"roles": []}));
        assert_eq!(doc.version(), 0);
        assert_eq!(store.origin(), DocumentOrigin::Missing);
    }

    #[test]
    fn test_replace_then_read() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir);

        let version = store
            .replace(br#"{"roles":[{"name":"admin","perms":["read","write"]}]}"#)
            .unwrap();

        assert_eq!(version, 1);
        assert_eq!(
            store.read().content(),
            &json!({"roles": [{"name": "admin", "perms": ["read", "write"]}]})
        );
    }

    #[test]
    fn test_invalid_replace_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir);

        let result = store.replace(b"not json");

        assert!(matches!(result, Err(DocumentError::InvalidDocument(_))));
        assert_eq!(store.read().version(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_reader_keeps_old_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir);

        let before = store.read();
        store.replace(b"[1,2,3]").unwrap();

        assert_eq!(before.content(), &json!({"roles": []}));
        assert_eq!(store.read().content(), &json!([1, 2, 3]));
    }

    #[test]
    fn test_unreadable_file_forgiving() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roles.json");
        fs::write(&path, "{oops").unwrap();

        let store = DocumentStore::open(&path, LoadPolicy::Forgiving).unwrap();
        assert_eq!(store.origin(), DocumentOrigin::Unreadable);
        assert_eq!(store.read().content(), &Document::default_content());
    }

    #[test]
    fn test_unreadable_file_strict() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roles.json");
        fs::write(&path, "{oops").unwrap();

        let result = DocumentStore::open(&path, LoadPolicy::Strict);
        assert!(matches!(result, Err(DocumentError::CorruptDocument { .. })));
    }

    #[test]
    fn test_second_open_is_locked_out() {
        let dir = TempDir::new().unwrap();
        let first = open_in(&dir);

        let second = DocumentStore::open(dir.path().join("roles.json"), LoadPolicy::Forgiving);
        assert!(matches!(second, Err(DocumentError::StoreLocked { .. })));

        drop(first);
        open_in(&dir);
    }

    #[test]
    fn test_loaded_file_preserves_key_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roles.json");
        fs::write(&path, r#"{"zeta":1,"alpha":2}"#).unwrap();

        let store = DocumentStore::open(&path, LoadPolicy::Strict).unwrap();
        let rendered = serde_json::to_string(store.read().content()).unwrap();
        assert_eq!(rendered, r#"{"zeta":1,"alpha":2}"#);
    }
}
