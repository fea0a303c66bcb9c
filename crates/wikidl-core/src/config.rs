use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::http_client::ClientSettings;

/// Global configuration loaded from `~/.config/wikidl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikidlConfig {
    /// Number of worker threads downloading articles concurrently.
    pub max_workers: usize,
    /// Upper bound on how long the dispatcher waits for submitted tasks (seconds).
    /// In-flight tasks are not cancelled when it is reached.
    pub await_timeout_secs: u64,
    /// TCP/TLS connect timeout per request (seconds).
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout per request (seconds).
    pub request_timeout_secs: u64,
    /// Optional User-Agent override; if missing, `wikidl/<version>` is sent.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for WikidlConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            await_timeout_secs: 600,
            connect_timeout_secs: 15,
            request_timeout_secs: 60,
            user_agent: None,
        }
    }
}

impl WikidlConfig {
    pub fn await_timeout(&self) -> Duration {
        Duration::from_secs(self.await_timeout_secs)
    }

    /// HTTP client settings derived from this config.
    pub fn client_settings(&self) -> ClientSettings {
        let mut settings = ClientSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..ClientSettings::default()
        };
        if let Some(ua) = &self.user_agent {
            settings.user_agent = ua.clone();
        }
        settings
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("wikidl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<WikidlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = WikidlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: WikidlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
