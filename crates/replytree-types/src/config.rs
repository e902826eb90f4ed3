//! Application configuration types for replytree.
//!
//! `AppConfig` represents the optional `config.toml` in the data directory.
//! Loading and environment overrides live in `replytree-infra::config`.

use serde::{Deserialize, Serialize};

/// Top-level configuration. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite connection URL. Defaults to a database file in the data directory.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Interface the REST API binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the REST API listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally visible base URL, used to resolve links in exported maps.
    #[serde(default)]
    pub public_url: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: default_host(),
            port: default_port(),
            public_url: None,
        }
    }
}

impl AppConfig {
    /// Base URL handed to export renderers, always ending in `/`.
    pub fn base_url(&self) -> String {
        let base = match &self.public_url {
            Some(url) => url.clone(),
            None => format!("http://{}:{}", self.host, self.port),
        };
        if base.ends_with('/') {
            base
        } else {
            format!("{base}/")
        }
    }
}
