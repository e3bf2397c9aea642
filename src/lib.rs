//! rolesd - a durable HTTP service for one roles/permissions JSON document
//!
//! The `document` module owns the file and the in-memory copy; everything
//! else is plumbing around it.

pub mod cli;
pub mod crash_point;
pub mod document;
pub mod http_server;
pub mod observability;
