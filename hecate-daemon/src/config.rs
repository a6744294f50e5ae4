//! YAML configuration.
//!
//! # Search path
//!
//! ```text
//! /etc/hecate/hecate.yaml
//! $HOME/.hecate/hecate.yaml
//! ./hecate.yaml
//! ```
//!
//! The first existing file wins. An explicit path (`--file`) bypasses the
//! search. Every key is optional and falls back to the defaults below.
//!
//! Functions taking explicit roots have an `_at` form used by tests; the
//! plain form derives them from the process environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use hecate_core::DEFAULT_FEED_CAPACITY;
use hecate_sync::HttpStoreConfig;

use crate::error::ConfigError;
use crate::readiness::ReadinessGate;

pub const APPLICATION_NAME: &str = "hecate";
pub const CONFIG_FILE_NAME: &str = "hecate.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Public hostname of this service; the readiness target.
    pub fqdn: String,
    pub scheme: String,
    pub primary: PrimaryConfig,
    pub readiness: ReadinessConfig,
    pub argus: ArgusConfig,
    /// Bound on queued change batches between registry and synchronizer.
    pub feed_capacity: usize,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fqdn: String::new(),
            scheme: "https".to_string(),
            primary: PrimaryConfig::default(),
            readiness: ReadinessConfig::default(),
            argus: ArgusConfig::default(),
            feed_capacity: DEFAULT_FEED_CAPACITY,
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PrimaryConfig {
    /// Listen address suffix, e.g. `:6100`.
    pub address: String,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            address: ":6100".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub timeout_secs: u64,
    pub interval_ms: u64,
    /// Extra wait after the hostname resolves, before confirmations start.
    pub settle_delay_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            interval_ms: 1_000,
            settle_delay_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArgusConfig {
    pub address: String,
    pub owner: String,
    pub bucket: String,
    pub auth: AuthConfig,
    pub timeout_secs: u64,
}

impl Default for ArgusConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:6600".to_string(),
            owner: "argus".to_string(),
            bucket: "webhooks".to_string(),
            auth: AuthConfig::default(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Full `Authorization` header value, e.g. `Basic dXNlcjpwYXNz`.
    pub basic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// `scheme://fqdn{primary.address}`; an empty scheme means `https`.
    pub fn self_url(&self) -> String {
        let scheme = if self.scheme.is_empty() {
            "https"
        } else {
            self.scheme.as_str()
        };
        format!("{scheme}://{}{}", self.fqdn, self.primary.address)
    }

    pub fn readiness_gate(&self) -> ReadinessGate {
        ReadinessGate::new(
            self.fqdn.clone(),
            Duration::from_secs(self.readiness.timeout_secs),
            Duration::from_millis(self.readiness.interval_ms),
        )
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.readiness.settle_delay_secs)
    }

    pub fn store_config(&self) -> HttpStoreConfig {
        HttpStoreConfig {
            address: self.argus.address.clone(),
            authorization: self.argus.auth.basic.clone(),
            timeout: Duration::from_secs(self.argus.timeout_secs),
        }
    }
}

/// Parse the config file at `path`.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // An empty file is a valid, all-defaults config.
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Search path rooted at explicit `etc`, `home` and `cwd` directories.
pub fn search_paths_at(etc: &Path, home: Option<&Path>, cwd: &Path) -> Vec<PathBuf> {
    let mut paths = vec![etc.join(APPLICATION_NAME).join(CONFIG_FILE_NAME)];
    if let Some(home) = home {
        paths.push(home.join(format!(".{APPLICATION_NAME}")).join(CONFIG_FILE_NAME));
    }
    paths.push(cwd.join(CONFIG_FILE_NAME));
    paths
}

/// `search_paths_at` for the running process.
pub fn search_paths() -> Vec<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    search_paths_at(Path::new("/etc"), dirs::home_dir().as_deref(), &cwd)
}

/// Load `explicit` if given, otherwise the first existing file in `candidates`.
pub fn discover_at(
    explicit: Option<&Path>,
    candidates: &[PathBuf],
) -> Result<(PathBuf, Config), ConfigError> {
    if let Some(path) = explicit {
        return Ok((path.to_path_buf(), load_from(path)?));
    }
    let Some(path) = candidates.iter().find(|p| p.is_file()) else {
        return Err(ConfigError::NotFound {
            searched: candidates.to_vec(),
        });
    };
    Ok((path.clone(), load_from(path)?))
}

/// `discover_at` over [`search_paths`].
pub fn discover(explicit: Option<&Path>) -> Result<(PathBuf, Config), ConfigError> {
    discover_at(explicit, &search_paths())
}
