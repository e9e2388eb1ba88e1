//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`CIPA_ROOT_FOLDER`)
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: defaults apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Environment variable overriding the root folder
pub const ENV_ROOT_FOLDER: &str = "CIPA_ROOT_FOLDER";

pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_HANDOFF_TTL_MINUTES: i64 = 10;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
pub const DATABASE_FILE: &str = "cipa.db";
pub const SIGNATURES_DIR: &str = "signatures";

/// Optional settings file (`~/.config/cipa/config.toml`)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    /// Base URL printed into remote-signing links
    pub public_base_url: Option<String>,
    pub handoff_ttl_minutes: Option<i64>,
    pub poll_interval_secs: Option<u64>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Load from `explicit` or the platform default location; defaults on any failure
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let path = match explicit.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => path,
            None => return Self::default(),
        };

        if !path.exists() {
            if explicit.is_some() {
                warn!("Config file not found: {} (using defaults)", path.display());
            }
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{} (using defaults)", e);
                Self::default()
            }
        }
    }
}

/// Resolved service settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub port: u16,
    pub public_base_url: String,
    pub handoff_ttl: chrono::Duration,
    pub poll_interval: Duration,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge CLI values, environment and TOML settings
    pub fn resolve(cli_root: Option<&Path>, cli_port: Option<u16>, toml: &TomlConfig) -> Self {
        let port = cli_port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let public_base_url = toml
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", port))
            .trim_end_matches('/')
            .to_string();

        Self {
            root_folder: resolve_root_folder(cli_root, ENV_ROOT_FOLDER, toml),
            port,
            public_base_url,
            handoff_ttl: chrono::Duration::minutes(
                toml.handoff_ttl_minutes
                    .filter(|m| *m > 0)
                    .unwrap_or(DEFAULT_HANDOFF_TTL_MINUTES),
            ),
            poll_interval: Duration::from_secs(
                toml.poll_interval_secs
                    .filter(|s| *s > 0)
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            log_level: toml.log_level.clone().unwrap_or_else(|| "info".to_string()),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn signatures_dir(&self) -> PathBuf {
        self.root_folder.join(SIGNATURES_DIR)
    }

    /// Create the root and artifact folders if missing
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        std::fs::create_dir_all(self.signatures_dir())?;
        Ok(())
    }
}

/// Root folder following the documented priority order
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml: &TomlConfig,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// `~/.config/cipa/config.toml` (or the platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cipa").join("config.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cipa"))
        .unwrap_or_else(|| PathBuf::from("./cipa_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_toml() {
        let config = ServiceConfig::resolve(Some(Path::new("/tmp/cipa-test")), None, &TomlConfig::default());
        assert_eq!(config.root_folder, PathBuf::from("/tmp/cipa-test"));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.public_base_url, format!("http://127.0.0.1:{}", DEFAULT_PORT));
        assert_eq!(config.handoff_ttl, chrono::Duration::minutes(10));
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/cipa-test/cipa.db"));
    }

    #[test]
    fn test_toml_values_apply_and_cli_port_wins() {
        let toml: TomlConfig = toml::from_str(
            r#"
            port = 8080
            public_base_url = "https://cipa.example.com/"
            handoff_ttl_minutes = 5
            poll_interval_secs = 0
            "#,
        )
        .unwrap();

        let config = ServiceConfig::resolve(Some(Path::new("/srv/cipa")), Some(9000), &toml);
        assert_eq!(config.port, 9000);
        assert_eq!(config.public_base_url, "https://cipa.example.com");
        assert_eq!(config.handoff_ttl, chrono::Duration::minutes(5));
        // Zero is ignored in favour of the default
        assert_eq!(config.poll_interval, Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS));
    }

    #[test]
    fn test_invalid_toml_reports_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();

        assert!(matches!(TomlConfig::load(&path), Err(Error::Config(_))));
        assert_eq!(TomlConfig::load_or_default(Some(&path)), TomlConfig::default());
    }
}
