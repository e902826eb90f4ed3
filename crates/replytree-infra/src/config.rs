//! Configuration loader for replytree.
//!
//! Reads `config.toml` from the data directory (`~/.replytree/` in production)
//! into [`AppConfig`], then applies environment overrides. Falls back to
//! sensible defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use replytree_types::config::AppConfig;

/// Environment variable selecting the data directory.
pub const DATA_DIR_ENV: &str = "REPLYTREE_DATA_DIR";

/// Resolve the data directory: `REPLYTREE_DATA_DIR`, else `~/.replytree`.
pub fn resolve_data_dir() -> PathBuf {
    resolve_data_dir_with(|key| std::env::var(key).ok())
}

fn resolve_data_dir_with(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".replytree");
    }

    // Last resort: current directory
    PathBuf::from(".replytree")
}

/// Load configuration from `{data_dir}/config.toml` plus the process environment.
///
/// - Missing file: defaults.
/// - Unreadable or unparsable file: logs a warning and uses defaults.
/// - Environment variables override whatever the file said.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config = load_config_file(data_dir).await;
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

async fn load_config_file(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Apply `REPLYTREE_DATABASE_URL`, `REPLYTREE_HOST`, `PORT` and
/// `REPLYTREE_PUBLIC_URL`. An unparsable `PORT` is ignored with a warning.
pub fn apply_env_overrides(
    mut config: AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> AppConfig {
    if let Some(url) = lookup("REPLYTREE_DATABASE_URL") {
        config.database_url = Some(url);
    }
    if let Some(host) = lookup("REPLYTREE_HOST") {
        config.host = host;
    }
    if let Some(port) = lookup("PORT") {
        match port.parse() {
            Ok(port) => config.port = port,
            Err(err) => tracing::warn!("Ignoring PORT={port}: {err}"),
        }
    }
    if let Some(url) = lookup("REPLYTREE_PUBLIC_URL") {
        config.public_url = Some(url);
    }
    config
}

/// Database URL from config, or `sqlite://{data_dir}/replytree.db?mode=rwc`.
pub fn database_url(config: &AppConfig, data_dir: &Path) -> String {
    config.database_url.clone().unwrap_or_else(|| {
        format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("replytree.db").display()
        )
    })
}
