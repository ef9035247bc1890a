//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.json` under the user's
//! config directory, then `RENTCAR_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory under the platform config/data roots used by the application.
pub const APP_DIR: &str = "rentcar";
/// Name of the configuration file inside [`APP_DIR`].
pub const CONFIG_FILE: &str = "config.json";
/// Prefix of environment overrides, e.g. `RENTCAR_DATA_DIR`.
pub const ENV_PREFIX: &str = "RENTCAR";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding `cars.json`, `rentals.json` and `users.json`.
    pub data_dir: PathBuf,
    /// Username of the bootstrap admin account.
    pub admin_username: String,
    /// Password of the bootstrap admin account.
    pub admin_password: String,
    /// Currency label shown next to prices.
    pub currency: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from("data")),
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
            currency: "RUB".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load using `path` as the optional file layer.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().into_owned())?
            .set_default("admin_username", defaults.admin_username)?
            .set_default("admin_password", defaults.admin_password)?
            .set_default("currency", defaults.currency)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        settings
            .try_deserialize()
            .context("failed to deserialize configuration")
    }
}

/// Default configuration file location.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Write the default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&AppConfig::default())
        .context("failed to serialize default configuration")?;
    fs::write(path, serialized).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join(CONFIG_FILE))?;
        let defaults = AppConfig::default();
        assert_eq!(config.admin_username, defaults.admin_username);
        assert_eq!(config.currency, defaults.currency);
        Ok(())
    }

    #[test]
    fn file_overrides_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{"data_dir": "/tmp/rentcar-test", "admin_password": "s3cret"}"#,
        )?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.data_dir, PathBuf::from("/tmp/rentcar-test"));
        assert_eq!(config.admin_password, "s3cret");
        assert_eq!(config.admin_username, "admin");
        Ok(())
    }

    #[test]
    fn default_file_is_written_once() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        write_default_config(&path)?;
        assert_eq!(AppConfig::load_from(&path)?.currency, "RUB");

        fs::write(&path, r#"{"currency": "EUR"}"#)?;
        write_default_config(&path)?;
        assert_eq!(AppConfig::load_from(&path)?.currency, "EUR");
        Ok(())
    }
}
