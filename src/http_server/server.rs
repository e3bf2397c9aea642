//! # HTTP Server
//!
//! Combines the liveness and roles routers behind a CORS layer and serves
//! them until Ctrl-C.

use std::io;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::config::HttpServerConfig;
use super::observability_routes::health_routes;
use super::roles_routes::roles_routes;
use crate::document::DocumentStore;
use crate::observability::{log_event, log_event_with_fields, Event, Logger};

/// HTTP server for the roles document
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server around an open store
    pub fn new(config: HttpServerConfig, store: Arc<DocumentStore>) -> Self {
        let router = Self::build_router(&config, store);
        Self { config, router }
    }

    fn build_router(config: &HttpServerConfig, store: Arc<DocumentStore>) -> Router {
        Router::new()
            .merge(health_routes())
            .merge(roles_routes(store))
            .layer(Self::cors_layer(config))
    }

    fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
        if config.allows_any_origin() {
            return CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
        }

        let parsed: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    Logger::warn("CORS_ORIGIN_IGNORED", &[("origin", origin.as_str())]);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods(Any)
            .allow_headers(Any)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind the listener, resolving the host if it is a name
    pub async fn bind(&self) -> io::Result<TcpListener> {
        TcpListener::bind(self.config.listen_target())
            .await
            .map_err(|e| {
                io::Error::new(e.kind(), format!("Failed to bind {}: {}", self.socket_addr(), e))
            })
    }

    /// Bind and serve until Ctrl-C
    pub async fn start(self) -> io::Result<()> {
        let listener = self.bind().await?;
        let addr = listener.local_addr()?;
        log_event_with_fields(Event::Serving, &[("addr", &addr.to_string())]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        log_event(Event::ShutdownComplete);
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        Logger::error("SIGNAL_HANDLER_FAILED", &[("error", &e.to_string())]);
        // Without a signal handler the server runs until killed
        std::future::pending::<()>().await;
    }
    log_event(Event::ShutdownStart);
}
