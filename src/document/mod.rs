//! # Document Store
//!
//! One JSON document, held in memory and mirrored to a single file.
//!
//! - `read()` returns the committed document without touching disk
//! - `replace()` validates, persists via temp file + rename, then publishes
//! - replaces are mutually exclusive; reads never observe a partial replace
//!
//! A missing file is not an error: the store serves `{"roles":[]}` until the
//! first replace.

pub mod errors;
pub mod persist;
pub mod store;

pub use errors::{DocumentError, DocumentResult};
pub use store::{Document, DocumentOrigin, DocumentStore, LoadPolicy};
