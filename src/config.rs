use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::tone::Tone;

/// Top-level configuration.
///
/// Stored as JSON, by default in `config.json` next to the executable.
/// Missing sections fall back to their defaults.
///
/// ```rust,no_run
/// use product_describer::config::Config;
///
/// let mut config = Config::load(Some("config.json".as_ref())).unwrap();
/// config.service.base_url = "http://describer.internal:8000".into();
/// config.save(Some("config.json".as_ref())).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the description service lives.
    pub service: ServiceConfig,
    /// Initial form state.
    pub form: FormConfig,
}

/// Description service endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Scheme and host, without the endpoint path.
    pub base_url: String,
    /// Whole-request timeout in seconds. `0` disables the timeout.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Tone selected when the form opens.
    pub default_tone: Tone,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Default config file path: `config.json` next to the executable, so
    /// the CLI and the desktop app share one file.
    pub fn config_path() -> Result<PathBuf> {
        let exe = std::env::current_exe().context("Cannot locate the running executable")?;
        exe.parent()
            .map(|dir| dir.join("config.json"))
            .context("Executable has no parent directory")
    }

    fn resolve(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(p.to_path_buf()),
            None => Self::config_path(),
        }
    }

    /// Read the config at `path` (or the default location). A missing file
    /// yields the built-in defaults: local service, professional tone.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve(path)?;
        if !path.exists() {
            log::warn!(
                "No config at {}; talking to {} with built-in defaults",
                path.display(),
                ServiceConfig::default().base_url
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!(
            "Config from {}: service {} ({}s timeout), tone {}",
            path.display(),
            config.service.base_url,
            config.service.timeout_secs,
            config.form.default_tone
        );
        Ok(config)
    }

    /// Write the config as pretty JSON to `path` (or the default location).
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = Self::resolve(path)?;
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }
}
