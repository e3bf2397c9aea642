//! Listener settings
//!
//! Read from the same keys in the service config file: `host`, `port` and
//! `cors_origins`. Missing keys take the defaults below.

use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpServerConfig {
    /// IP literal or resolvable hostname (default: "0.0.0.0")
    pub host: String,

    /// Listen port (default: 8080)
    pub port: u16,

    /// Origins allowed by CORS. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

impl HttpServerConfig {
    /// Host and port in the form `TcpListener::bind` resolves
    pub fn listen_target(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    /// Printable `host:port`, bracketing IPv6 literals
    pub fn socket_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty()
    }
}
