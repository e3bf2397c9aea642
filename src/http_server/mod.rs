//! # HTTP Server Module
//!
//! Axum server exposing the roles document.
//!
//! # Endpoints
//!
//! - `GET /ping` - Liveness probe, answers `pong`
//! - `GET /health` - Status and build version
//! - `GET /roles` - Current document
//! - `POST /roles` - Replace the document

pub mod config;
pub mod observability_routes;
pub mod roles_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use server::HttpServer;
