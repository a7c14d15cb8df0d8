//! Configuration management for datasource structure tooling
//!
//! Handles loading and saving settings to ~/.config/dsstructure/config.toml,
//! with environment overrides (a `.env` file is honoured).

use crate::structure::view::View;
use crate::structure::{DiscriminatorResolver, KeyResolver, PlaceholderResolver};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_SQLITE_PATH: &str = "DS_SQLITE_PATH";
pub const ENV_LOG: &str = "DS_LOG";
pub const ENV_KEY_RESOLUTION: &str = "DS_KEY_RESOLUTION";

/// How decoded keys pick their variant
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyResolution {
    /// Use the `type` discriminator
    #[default]
    Discriminator,
    /// Decode every key as a placeholder
    Placeholder,
}

impl KeyResolution {
    pub fn resolver(&self) -> Box<dyn KeyResolver> {
        match self {
            KeyResolution::Discriminator => Box::new(DiscriminatorResolver),
            KeyResolution::Placeholder => Box::new(PlaceholderResolver),
        }
    }
}

impl FromStr for KeyResolution {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discriminator" => Ok(KeyResolution::Discriminator),
            "placeholder" => Ok(KeyResolution::Placeholder),
            other => bail!("unknown key resolution '{}'", other),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Application configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// SQLite file to describe when none is given on the command line
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,
    /// env_logger filter, e.g. "info" or "datasource_structure=debug"
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub key_resolution: KeyResolution,
    /// Sort columns and keys before output
    #[serde(default = "default_true")]
    pub sort_structure: bool,
    #[serde(default = "default_true")]
    pub pretty: bool,
    #[serde(default)]
    pub view: View,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sqlite_path: None,
            log_filter: default_log_filter(),
            key_resolution: KeyResolution::default(),
            sort_structure: true,
            pretty: true,
            view: View::default(),
        }
    }
}

impl AppConfig {
    /// Get the config file path (~/.config/dsstructure/config.toml)
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("dsstructure");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from disk and the environment, creating the file
    /// with defaults if it doesn't exist.
    ///
    /// Problems are returned as warnings rather than logged, since this runs
    /// before the logger is configured from `log_filter`.
    pub fn load() -> (Self, Vec<String>) {
        let loaded = Self::try_load();
        if loaded.is_err() {
            let _ = Self::default().save();
        }

        dotenvy::dotenv().ok();
        Self::from_sources(loaded, |key| std::env::var(key).ok())
    }

    fn from_sources<F>(loaded: Result<Self>, lookup: F) -> (Self, Vec<String>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();
        let mut config = loaded.unwrap_or_else(|e| {
            warnings.push(format!("using default configuration: {:#}", e));
            Self::default()
        });

        if let Err(e) = config.apply_env(lookup) {
            warnings.push(format!("ignoring environment override: {:#}", e));
        }
        (config, warnings)
    }

    /// Try to load configuration from disk
    fn try_load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).context("Failed to read config file")?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_SQLITE_PATH) {
            self.sqlite_path = Some(PathBuf::from(path));
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        if let Some(resolution) = lookup(ENV_KEY_RESOLUTION) {
            self.key_resolution = resolution.parse()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_toml_gives_defaults() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let config = AppConfig::from_toml(
            r#"
            sqlite_path = "/data/shop.db"
            log_filter = "debug"
            key_resolution = "placeholder"
            sort_structure = false
            view = "internal"
            "#,
        )
        .unwrap();
        assert_eq!(config.sqlite_path, Some(PathBuf::from("/data/shop.db")));
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.key_resolution, KeyResolution::Placeholder);
        assert!(!config.sort_structure);
        assert!(config.pretty);
        assert_eq!(config.view, View::Internal);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_SQLITE_PATH, "/tmp/x.db"),
            (ENV_KEY_RESOLUTION, "Placeholder"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.sqlite_path, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(config.key_resolution, KeyResolution::Placeholder);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_bad_key_resolution() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(|_| Some("sometimes".to_string())).is_err());
    }

    #[test]
    fn test_broken_file_falls_back_with_warning() {
        let (config, warnings) =
            AppConfig::from_sources(AppConfig::from_toml("pretty = \"yes\""), |_| None);
        assert_eq!(config, AppConfig::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("using default configuration"));
    }

    #[test]
    fn test_bad_override_is_reported() {
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_LOG, "debug"), (ENV_KEY_RESOLUTION, "sometimes")]);
        let (config, warnings) =
            AppConfig::from_sources(Ok(AppConfig::default()), |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.key_resolution, KeyResolution::Discriminator);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("sometimes"));
    }

    #[test]
    fn test_clean_sources_have_no_warnings() {
        let (_, warnings) = AppConfig::from_sources(Ok(AppConfig::default()), |_| None);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_config_serializes_to_toml() {
        let text = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), AppConfig::default());
    }
}
