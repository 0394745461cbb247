//! Configuration management for formcourier.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::quota::{Quota, QuotaPolicy, DEFAULT_COOLDOWN_HOURS, DEFAULT_DAILY_CAP};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "formcourier";

/// Default state file name.
const STATE_FILE_NAME: &str = "state.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FORMCOURIER_`)
/// 2. TOML config file at `~/.config/formcourier/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Relay endpoint configuration.
    pub relay: RelayConfig,
    /// Rate limit configuration.
    pub quota: QuotaConfig,
    /// State store configuration.
    pub store: StoreConfig,
    /// Status notice configuration.
    pub notice: NoticeConfig,
}

/// Relay-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// The form-relay endpoint URL (e.g. `https://formspree.io/f/yourid`).
    /// Must be set before `send` can be used.
    pub endpoint: Option<String>,
    /// Name of a hidden anti-spam field to include, sent empty
    /// (e.g. `_gotcha`).
    pub honeypot_field: Option<String>,
}

/// Rate-limit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Which rate-limit policy to enforce.
    pub policy: QuotaPolicy,
    /// Sends allowed per calendar day (daily counter policy).
    pub daily_cap: u32,
    /// Cooldown window in hours (cooldown policy).
    pub cooldown_hours: u32,
}

/// State store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the state file.
    /// Defaults to `~/.local/share/formcourier/state.json`
    pub state_path: Option<PathBuf>,
}

/// Status notice configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    /// Seconds a notice stays visible before the surface hides it.
    pub visible_secs: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            policy: QuotaPolicy::default(),
            daily_cap: DEFAULT_DAILY_CAP,
            cooldown_hours: DEFAULT_COOLDOWN_HOURS,
        }
    }
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self { visible_secs: 5 }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FORMCOURIER_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("FORMCOURIER_").split("_"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.relay.endpoint {
            if !endpoint.starts_with("https://") {
                return Err(Error::ConfigValidation {
                    message: format!("relay endpoint must use https: {endpoint}"),
                });
            }
        }

        if self.quota.daily_cap == 0 {
            return Err(Error::ConfigValidation {
                message: "quota daily_cap must be at least 1".to_string(),
            });
        }

        if self.quota.cooldown_hours == 0 {
            return Err(Error::ConfigValidation {
                message: "quota cooldown_hours must be at least 1".to_string(),
            });
        }

        if self.notice.visible_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "notice visible_secs must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Get the configured relay endpoint.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no endpoint is set.
    pub fn endpoint(&self) -> Result<&str> {
        self.relay
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::ConfigValidation {
                message: "relay endpoint is not configured \
                          (set relay.endpoint or FORMCOURIER_RELAY_ENDPOINT)"
                    .to_string(),
            })
    }

    /// Get the state file path, resolving defaults if not set.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.store
            .state_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(STATE_FILE_NAME))
    }

    /// Build the quota gate described by this configuration.
    #[must_use]
    pub fn quota(&self) -> Quota {
        Quota::new(
            self.quota.policy,
            self.quota.daily_cap,
            chrono::Duration::hours(i64::from(self.quota.cooldown_hours)),
        )
    }

    /// Get the notice visibility as a Duration.
    #[must_use]
    pub fn notice_visible(&self) -> Duration {
        Duration::from_secs(self.notice.visible_secs)
    }
}
