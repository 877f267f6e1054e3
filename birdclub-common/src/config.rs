//! Configuration loading and root folder resolution
//!
//! Priority for every setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: callers log the
//! [`Error::Config`] and continue with `TomlConfig::default()`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "BIRDCLUB_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "birdclub.db";

/// Default listen address
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5780";

/// On-disk TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub logging: LoggingConfig,
    /// Bird observation feed
    pub ebird: FeedConfig,
    /// Club event feed
    pub events: FeedConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "birdclub_api=info,birdclub_common=info,tower_http=info".to_string(),
        }
    }
}

/// Connection settings for one upstream feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Locate the platform config file, if one exists
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("birdclub").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/birdclub/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve the root folder: CLI → ENV → TOML → OS default
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/birdclub (or /var/lib/birdclub for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("birdclub"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/birdclub"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("birdclub"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/birdclub"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("birdclub"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\birdclub"))
    } else {
        PathBuf::from("./birdclub_data")
    }
}

/// Database path inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE)
}

/// API key must be non-empty and not just whitespace
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Pick an API key: CLI/ENV value first, then TOML
///
/// Returns `None` (with a warning) when neither source holds a usable key.
pub fn resolve_api_key(
    feed_name: &str,
    cli_or_env: Option<&str>,
    toml_value: Option<&str>,
) -> Option<String> {
    if let Some(key) = cli_or_env.filter(|k| is_valid_key(k)) {
        info!("{} API key loaded from command line/environment", feed_name);
        return Some(key.trim().to_string());
    }

    if let Some(key) = toml_value.filter(|k| is_valid_key(k)) {
        info!("{} API key loaded from TOML config", feed_name);
        return Some(key.trim().to_string());
    }

    warn!("{} API key not configured; feed requests will fail", feed_name);
    None
}
