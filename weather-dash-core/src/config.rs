use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::client::{ClientMode, demo::DEFAULT_DEMO_LATENCY, live::DEFAULT_REQUEST_TIMEOUT};

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// api_key = "..."
/// request_timeout_secs = 10
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// OpenWeatherMap API key. Without one the dashboard runs in demo mode.
    pub api_key: Option<String>,

    pub request_timeout_secs: Option<u64>,

    /// Simulated latency of demo lookups.
    pub demo_latency_ms: Option<u64>,
}

impl Config {
    /// Configured API key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    pub fn mode(&self) -> ClientMode {
        if self.api_key().is_some() { ClientMode::Live } else { ClientMode::Demo }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn demo_latency(&self) -> Duration {
        self.demo_latency_ms.map(Duration::from_millis).unwrap_or(DEFAULT_DEMO_LATENCY)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
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

    pub fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-dash", "weather-dash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_demo_mode() {
        let cfg = Config::default();

        assert_eq!(cfg.mode(), ClientMode::Demo);
        assert_eq!(cfg.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(cfg.demo_latency(), DEFAULT_DEMO_LATENCY);
    }

    #[test]
    fn blank_api_key_stays_in_demo_mode() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());

        assert_eq!(cfg.api_key(), None);
        assert_eq!(cfg.mode(), ClientMode::Demo);
    }

    #[test]
    fn api_key_switches_to_live_mode() {
        let mut cfg = Config::default();
        cfg.set_api_key(" KEY \n".into());

        assert_eq!(cfg.api_key(), Some("KEY"));
        assert_eq!(cfg.mode(), ClientMode::Live);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_and_load_through_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.request_timeout_secs = Some(3);
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
