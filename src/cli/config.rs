//! Service configuration
//!
//! Loaded from a JSON file; every key is optional:
//!
//! ```json
//! {
//!   "host": "0.0.0.0",
//!   "port": 8080,
//!   "roles_file": "../config/roles.json",
//!   "strict_load": false,
//!   "cors_origins": ["http://localhost:5173"]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::args::StoreArgs;
use super::errors::{CliError, CliResult};
use crate::document::LoadPolicy;
use crate::http_server::HttpServerConfig;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// `host`, `port` and `cors_origins`
    #[serde(flatten)]
    pub http: HttpServerConfig,

    /// Document path (default: ../config/roles.json)
    #[serde(default = "default_roles_file")]
    pub roles_file: PathBuf,

    /// Refuse to boot when the document file exists but does not parse
    #[serde(default)]
    pub strict_load: bool,
}

fn default_roles_file() -> PathBuf {
    PathBuf::from("../config/roles.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpServerConfig::default(),
            roles_file: default_roles_file(),
            strict_load: false,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Build the effective configuration from command-line options
    pub fn resolve(args: &StoreArgs) -> CliResult<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(roles_file) = &args.roles_file {
            config.roles_file = roles_file.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        if self.http.port == 0 {
            return Err(CliError::config_error("port must be > 0"));
        }

        if self.http.host.trim().is_empty() {
            return Err(CliError::config_error("host must not be empty"));
        }

        if self.roles_file.as_os_str().is_empty() {
            return Err(CliError::config_error("roles_file must not be empty"));
        }

        if self.roles_file.is_dir() {
            return Err(CliError::config_error(format!(
                "roles_file is a directory: {}",
                self.roles_file.display()
            )));
        }

        Ok(())
    }

    pub fn load_policy(&self) -> LoadPolicy {
        if self.strict_load {
            LoadPolicy::Strict
        } else {
            LoadPolicy::Forgiving
        }
    }

    pub fn http_config(&self) -> HttpServerConfig {
        self.http.clone()
    }
}
