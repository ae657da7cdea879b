//! Configuration management for lasthook
//!
//! Values come from three layers: built-in defaults, the TOML config file,
//! and command line / environment overrides. [`Settings::resolve`] merges and
//! validates them into the runtime settings every hook is built from.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::types::{Milliseconds, Username};

/// Default poll interval (10 seconds).
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;

/// Default bound on the upstream part of one poll cycle.
pub const DEFAULT_CYCLE_TIMEOUT: &str = "30s";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Last.fm API access and candidate users
    pub lastfm: LastFmConfig,

    /// Poll loop settings
    pub polling: PollingConfig,

    /// Output hooks, notified in this order
    pub hooks: Vec<HookConfig>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Last.fm settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LastFmConfig {
    /// API base URL, e.g. `https://ws.audioscrobbler.com/2.0/`
    pub api_url: Option<String>,

    /// API key
    pub api_key: Option<String>,

    /// Users to check, in order; the first one actively playing wins
    pub users: Vec<String>,
}

/// Poll loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Milliseconds between poll cycles
    pub interval_ms: Milliseconds,

    /// Report the most recent track even when it is not playing right now
    pub show_inactive_tracks: bool,

    /// Upper bound for querying Last.fm within one cycle (humantime, e.g. "30s")
    pub cycle_timeout: String,
}

/// One configured output hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HookConfig {
    FileDump(FileDumpConfig),
    HttpServer(HttpServerConfig),
    Mqtt(MqttConfig),
    GeekMagic(GeekMagicConfig),
}

/// Write the current track to a text file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDumpConfig {
    pub out_file: PathBuf,

    /// Truncate longer output to this many characters (including "...");
    /// 0 means no limit
    pub max_length: Option<usize>,
}

/// Serve the current track as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpServerConfig {
    pub bind: String,
    pub port: u16,
}

/// Publish the current track to an MQTT broker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,

    /// Topic to publish to (required)
    pub topic: String,

    /// Client id (default: `lasthook-<random uuid>`)
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: u64,
    pub retain: bool,
}

/// Push cover art to a GeekMagic desktop display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeekMagicConfig {
    /// Base URL of the device (required)
    pub url: String,

    /// File name the cover is stored under on the device
    pub cover_file_name: Option<String>,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: Milliseconds::new(DEFAULT_INTERVAL_MS),
            show_inactive_tracks: false,
            cycle_timeout: DEFAULT_CYCLE_TIMEOUT.to_string(),
        }
    }
}

impl Default for FileDumpConfig {
    fn default() -> Self {
        Self {
            out_file: PathBuf::from("output.txt"),
            max_length: None,
        }
    }
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 1457,
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            topic: String::new(),
            client_id: None,
            username: None,
            password: None,
            keep_alive_secs: 30,
            retain: false,
        }
    }
}

/// Values supplied on the command line or through the environment.
///
/// Every `Some` (or non-empty list) replaces the config file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub interval_ms: Option<u64>,
    pub show_inactive_tracks: bool,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub users: Vec<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::config("Could not determine config directory"))?;
        Ok(config_dir.join("lasthook").join("config.toml"))
    }

    /// Apply command line / environment overrides on top of the file values.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(interval) = overrides.interval_ms {
            self.polling.interval_ms = Milliseconds::new(interval);
        }
        if overrides.show_inactive_tracks {
            self.polling.show_inactive_tracks = true;
        }
        if overrides.api_url.is_some() {
            self.lastfm.api_url = overrides.api_url;
        }
        if overrides.api_key.is_some() {
            self.lastfm.api_key = overrides.api_key;
        }
        if !overrides.users.is_empty() {
            self.lastfm.users = overrides.users;
        }
        self
    }

    /// Validate configuration values.
    ///
    /// Call this after loading and applying overrides.
    pub fn validate(&self) -> Result<()> {
        // Validate log_level is a known level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "log_level must be one of {:?}, got '{}'",
                valid_levels, self.general.log_level
            )));
        }

        if self.polling.interval_ms.is_zero() {
            return Err(Error::config("interval_ms must be at least 1"));
        }

        self.cycle_timeout()?;
        self.api_url()?;

        if !self
            .lastfm
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
        {
            return Err(Error::config(
                "Last.fm API key is required (lastfm.api_key or LASTFM_API_KEY)",
            ));
        }

        if self.lastfm.users.iter().any(|user| user.trim().is_empty()) {
            return Err(Error::config("lastfm.users must not contain empty names"));
        }

        Ok(())
    }

    /// Parsed upstream base URL
    fn api_url(&self) -> Result<Url> {
        let raw = self.lastfm.api_url.as_deref().ok_or_else(|| {
            Error::config("Last.fm API URL is required (lastfm.api_url or LASTFM_API_URL)")
        })?;

        let url = Url::parse(raw)
            .map_err(|e| Error::config(format!("api_url '{raw}' is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "api_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(url)
    }

    /// Parsed per-cycle upstream timeout
    fn cycle_timeout(&self) -> Result<Duration> {
        let timeout = humantime::parse_duration(&self.polling.cycle_timeout).map_err(|e| {
            Error::config(format!(
                "cycle_timeout '{}' is not a duration: {e}",
                self.polling.cycle_timeout
            ))
        })?;
        if timeout.is_zero() {
            return Err(Error::config("cycle_timeout must be greater than zero"));
        }
        Ok(timeout)
    }
}

/// Resolved runtime settings handed to the poller and every hook factory.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: String,
    pub api_url: Url,
    pub api_key: String,
    pub users: Vec<Username>,
    pub interval: Milliseconds,
    pub show_inactive_tracks: bool,
    pub cycle_timeout: Duration,
    pub hooks: Vec<HookConfig>,
}

impl Settings {
    /// Merge overrides into `config`, validate, and resolve.
    pub fn resolve(config: Config, overrides: Overrides) -> Result<Self> {
        let config = config.with_overrides(overrides);
        config.validate()?;

        Ok(Self {
            api_url: config.api_url()?,
            cycle_timeout: config.cycle_timeout()?,
            log_level: config.general.log_level.to_lowercase(),
            api_key: config.lastfm.api_key.unwrap_or_default(),
            users: config.lastfm.users.into_iter().map(Username::from).collect(),
            interval: config.polling.interval_ms,
            show_inactive_tracks: config.polling.show_inactive_tracks,
            hooks: config.hooks,
        })
    }
}
