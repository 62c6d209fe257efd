//! Settings loaded from a TOML file.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::policy::{BackoffPolicy, HotnessPolicy};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub watch: WatchSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub feed: FeedSettings,
    /// Polled in the listed order.
    #[serde(default)]
    pub accounts: Vec<AccountSettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    pub channel: String,
    pub min_interval_secs: u64,
    pub max_interval_secs: u64,
    pub stagger_min_secs: u64,
    pub stagger_max_secs: u64,
    pub stats_interval_secs: u64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            channel: "Main".into(),
            min_interval_secs: 150,
            max_interval_secs: 450,
            stagger_min_secs: 1,
            stagger_max_secs: 20,
            stats_interval_secs: 60,
        }
    }
}

impl DiscoverySettings {
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    pub initial_backoff_secs: u64,
    pub gravity: f64,
    pub threshold: f64,
    /// Cap on remembered finished ids per account; unbounded when unset.
    pub done_capacity: Option<usize>,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            initial_backoff_secs: 600,
            gravity: HotnessPolicy::DEFAULT_GRAVITY,
            threshold: HotnessPolicy::DEFAULT_THRESHOLD,
            done_capacity: None,
        }
    }
}

impl WatchSettings {
    pub fn hotness(&self) -> HotnessPolicy {
        HotnessPolicy::new(self.gravity, self.threshold)
    }

    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_secs(self.initial_backoff_secs))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    /// Directory for the file store; documents stay in memory when unset.
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedSettings {
    /// Scripted feed fixture used instead of a live client.
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountSettings {
    pub location: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    /// Opaque to the core; handed to the feed client.
    #[serde(default)]
    pub credential: BTreeMap<String, String>,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.discovery;
        if d.channel.trim().is_empty() {
            return Err(invalid("discovery.channel must not be empty"));
        }
        if d.min_interval_secs == 0 || d.min_interval_secs > d.max_interval_secs {
            return Err(invalid(
                "discovery interval must satisfy 0 < min_interval_secs <= max_interval_secs",
            ));
        }
        if d.stagger_min_secs > d.stagger_max_secs {
            return Err(invalid("discovery.stagger_min_secs exceeds stagger_max_secs"));
        }
        if d.stats_interval_secs == 0 {
            return Err(invalid("discovery.stats_interval_secs must be positive"));
        }

        let w = &self.watch;
        if w.initial_backoff_secs == 0 {
            return Err(invalid("watch.initial_backoff_secs must be positive"));
        }
        if !(w.gravity.is_finite() && w.gravity > 0.0) {
            return Err(invalid("watch.gravity must be a positive number"));
        }
        if !(w.threshold.is_finite() && w.threshold > 0.0) {
            return Err(invalid("watch.threshold must be a positive number"));
        }
        if w.done_capacity == Some(0) {
            return Err(invalid("watch.done_capacity must be positive when set"));
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if account.location.trim().is_empty() {
                return Err(invalid("account location must not be empty"));
            }
            if !seen.insert(account.location.as_str()) {
                return Err(invalid(&format!(
                    "duplicate account location {:?}",
                    account.location
                )));
            }
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Invalid(msg.to_string())
}
