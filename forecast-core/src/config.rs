use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::{
    location::FALLBACK_COORDINATE,
    model::Coordinate,
    presenter::{DEFAULT_ICON_URL_TEMPLATE, IconUrls},
    provider::openweather::{DEFAULT_FORECAST_URL, DEFAULT_TIMEOUT},
};

/// Environment variable that overrides the API key stored on disk.
pub const API_KEY_ENV: &str = "FORECAST_API_KEY";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// forecast_url = "https://api.openweathermap.org/data/2.5/forecast"
/// icon_url_template = "https://openweathermap.org/img/w/{icon}.png"
/// request_timeout_secs = 10
///
/// [fallback]
/// latitude = 51.5074
/// longitude = 0.1278
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key. Prefer the environment override for anything
    /// that is not a personal machine.
    pub api_key: Option<String>,

    pub forecast_url: String,

    /// Image URL template; `{icon}` is replaced with the icon code.
    pub icon_url_template: String,

    pub request_timeout_secs: u64,

    /// Used when the device location is denied or unavailable.
    pub fallback: Coordinate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            icon_url_template: DEFAULT_ICON_URL_TEMPLATE.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            fallback: FALLBACK_COORDINATE,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "forecast", "forecast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from `FORECAST_API_KEY`, falling back to the config file.
    pub fn resolved_api_key(&self) -> Result<String> {
        self.api_key_with_override(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with_override(&self, env_key: Option<String>) -> Result<String> {
        env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: run `forecast configure` or set {API_KEY_ENV}."
                )
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn icon_urls(&self) -> IconUrls {
        IconUrls::new(self.icon_url_template.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_errors_with_hint() {
        let cfg = Config::default();
        let err = cfg.api_key_with_override(None).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("forecast configure"));
    }

    #[test]
    fn env_override_wins_over_file() {
        let cfg = Config {
            api_key: Some("FILE_KEY".into()),
            ..Config::default()
        };

        let key = cfg.api_key_with_override(Some("ENV_KEY".into())).unwrap();
        assert_eq!(key, "ENV_KEY");

        let key = cfg.api_key_with_override(None).unwrap();
        assert_eq!(key, "FILE_KEY");
    }

    #[test]
    fn blank_keys_are_ignored() {
        let cfg = Config {
            api_key: Some("  ".into()),
            ..Config::default()
        };

        assert!(cfg.api_key_with_override(Some(String::new())).is_err());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = \"abc\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.forecast_url, DEFAULT_FORECAST_URL);
        assert_eq!(cfg.fallback, FALLBACK_COORDINATE);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn save_then_load_keeps_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config {
            api_key: Some("abc".into()),
            fallback: Coordinate::new(35.6762, 139.6503),
            ..Config::default()
        };
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.fallback, Coordinate::new(35.6762, 139.6503));
    }

    #[test]
    fn saved_file_carries_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        Config::default().save_to(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();

        assert!(written.contains(&format!("forecast_url = \"{DEFAULT_FORECAST_URL}\"")));
        assert!(written.contains(&format!(
            "icon_url_template = \"{DEFAULT_ICON_URL_TEMPLATE}\""
        )));
        assert!(written.contains("request_timeout_secs = 10"));
        assert!(written.contains("[fallback]"));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let cfg = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(cfg.request_timeout(), Duration::from_secs(1));
    }
}
