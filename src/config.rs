//! Configuration for polling one account
//!
//! Read from `~/.powerpoll/config.json` (or an explicit path); every field
//! has a default so a missing file is not an error. Command-line flags are
//! layered on top with [`Config::with_overrides`].

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{PowerError, Result};

/// Default polling interval in minutes
pub const DEFAULT_SCAN_INTERVAL_MINUTES: u64 = 30;

/// Longest accepted polling interval (one week)
pub const MAX_SCAN_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Default per-call HTTP timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Consumer number scoping every upstream query
    pub cons_no: String,
    pub scan_interval_minutes: u64,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cons_no: String::new(),
            scan_interval_minutes: DEFAULT_SCAN_INTERVAL_MINUTES,
            base_url: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Values given on the command line; `None` keeps the file value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub cons_no: Option<String>,
    pub scan_interval_minutes: Option<u64>,
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    /// A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| {
            PowerError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Default config path (`~/.powerpoll/config.json`)
    pub fn default_path() -> Result<PathBuf> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| PowerError::Config("Cannot determine home directory".into()))?;
        Ok(base_dirs.home_dir().join(".powerpoll").join("config.json"))
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(cons_no) = overrides.cons_no {
            self.cons_no = cons_no;
        }
        if let Some(minutes) = overrides.scan_interval_minutes {
            self.scan_interval_minutes = minutes;
        }
        if let Some(url) = overrides.base_url {
            self.base_url = url;
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cons_no.trim().is_empty() {
            return Err(PowerError::Config(
                "consumer number is required (--cons-no or cons_no in config file)".into(),
            ));
        }
        if self.scan_interval_minutes == 0 {
            return Err(PowerError::Config(
                "scan interval must be at least 1 minute".into(),
            ));
        }
        if self.scan_interval_minutes > MAX_SCAN_INTERVAL_MINUTES {
            return Err(PowerError::Config(format!(
                "scan interval must be at most {} minutes",
                MAX_SCAN_INTERVAL_MINUTES
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(PowerError::Config(
                "request timeout must be at least 1 second".into(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(PowerError::Config(
                "base URL is required (--base-url or base_url in config file)".into(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(PowerError::Config(format!(
                "base URL must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_minutes.saturating_mul(60))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PowerError::Parse(format!("Serialization failed: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}
