// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "watchparty.toml";
/// Prefix for environment overrides, nested keys split on `__`
pub const ENV_PREFIX: &str = "WATCHPARTY_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Root of the durable flat-file store
    pub data_dir: PathBuf,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Ephemeral tier settings
    pub registry: RegistrySettings,
    /// Video catalog provider settings
    pub provider: ProviderSettings,
}

/// Ephemeral tier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Idle lifetime of a live room; `None` keeps rooms until restart
    pub ttl_secs: Option<u64>,
    /// How often expired live rooms are purged
    pub sweep_interval_secs: u64,
}

/// Video catalog provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// playlistItems endpoint
    pub base_url: String,
    /// API key, expansion fails without one
    pub api_key: Option<String>,
    /// Upper bound for a whole expansion
    pub timeout_ms: u64,
    /// Maximum number of entries taken from one provider playlist
    pub max_items: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            registry: RegistrySettings::default(),
            provider: ProviderSettings::default(),
        }
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            ttl_secs: Some(60 * 60 * 24), // 1 day
            sweep_interval_secs: 60,
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://youtube.googleapis.com/youtube/v3/playlistItems".to_string(),
            api_key: None,
            timeout_ms: 10_000,
            max_items: 500,
        }
    }
}

impl RegistrySettings {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Settings {
    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }

    /// Load defaults, then `watchparty.toml`, then `WATCHPARTY_*` env vars
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Same as [`Settings::load`] with an explicit config file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let settings: Settings = Self::figment()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("unknown log level {:?}", self.log_level);
        }
        if self.registry.ttl_secs == Some(0) {
            bail!("registry.ttl_secs must be positive when set");
        }
        if self.registry.sweep_interval_secs == 0 {
            bail!("registry.sweep_interval_secs must be positive");
        }
        if self.provider.timeout_ms == 0 {
            bail!("provider.timeout_ms must be positive");
        }
        if self.provider.max_items == 0 {
            bail!("provider.max_items must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod config_tests;
