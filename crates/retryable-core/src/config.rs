use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::transport::http::HttpOptions;

/// Connectivity probe parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// `host:port` to TCP-connect to when checking reachability.
    pub probe_addr: String,
    /// Seconds between probes.
    pub probe_interval_secs: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_addr: "1.1.1.1:443".to_string(),
            probe_interval_secs: 5,
        }
    }
}

impl ConnectivityConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }
}

/// Where callback events run: inline on the transport thread, or on one dedicated thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackExecutorKind {
    Inline,
    #[default]
    Dedicated,
}

/// Global configuration loaded from `~/.config/retryable/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryableConfig {
    /// Connect timeout per attempt, in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout per attempt, in seconds.
    pub timeout_secs: u64,
    /// Follow HTTP redirects.
    pub follow_redirects: bool,
    /// "inline" or "dedicated" (default).
    #[serde(default)]
    pub callback_executor: Option<CallbackExecutorKind>,
    /// Optional connectivity probe; without it, retries only happen on request.
    #[serde(default)]
    pub connectivity: Option<ConnectivityConfig>,
}

impl Default for RetryableConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 30,
            follow_redirects: true,
            callback_executor: None,
            connectivity: Some(ConnectivityConfig::default()),
        }
    }
}

impl RetryableConfig {
    /// Transfer options for the HTTP transport.
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            follow_redirects: self.follow_redirects,
        }
    }

    pub fn callback_executor_kind(&self) -> CallbackExecutorKind {
        self.callback_executor.unwrap_or_default()
    }
}

/// Directory for runtime state (log file, control socket): `~/.local/state/retryable`.
pub fn state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("retryable")?;
    Ok(xdg_dirs.get_state_home().join("retryable"))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("retryable")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RetryableConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<RetryableConfig> {
    if !path.exists() {
        let default_cfg = RetryableConfig::default();
        let toml = to_toml(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("writing default config to {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: RetryableConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

/// Render a configuration the way it is written to disk.
pub fn to_toml(cfg: &RetryableConfig) -> Result<String> {
    toml::to_string_pretty(cfg).context("serializing config")
}
