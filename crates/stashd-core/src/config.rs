//! Process-wide configuration for stashd.
//!
//! All settings are fixed at startup and immutable thereafter. Values are
//! loaded from environment variables via [`StashConfig::from_env`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default size budget for one upload: 1 GiB.
const DEFAULT_MAX_BODY_SIZE: u64 = 1024 * 1024 * 1024;

/// Stashd server configuration.
///
/// # Examples
///
/// ```
/// use stashd_core::StashConfig;
///
/// let config = StashConfig::default();
/// assert_eq!(config.listen, "0.0.0.0:9292");
/// assert_eq!(config.request_timeout_secs, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct StashConfig {
    /// Bind address for the server (e.g. `"0.0.0.0:9292"`).
    #[builder(default = String::from("0.0.0.0:9292"))]
    pub listen: String,

    /// Request deadline in seconds, covering the whole per-request pipeline.
    #[builder(default = 300)]
    pub request_timeout_secs: u64,

    /// Maximum number of bytes accepted in one upload body.
    #[builder(default = DEFAULT_MAX_BODY_SIZE)]
    pub max_body_size: u64,

    /// Root directory for the filesystem storage backend.
    #[builder(default = String::from("/tmp"))]
    pub storage_root: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            listen: String::from("0.0.0.0:9292"),
            request_timeout_secs: 300,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            storage_root: String::from("/tmp"),
            log_level: String::from("info"),
        }
    }
}

impl StashConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `STASHD_LISTEN` | `0.0.0.0:9292` |
    /// | `STASHD_TIMEOUT_SECS` | `300` |
    /// | `STASHD_MAX_BODY_SIZE` | `1073741824` |
    /// | `STASHD_ROOT` | `/tmp` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Unparseable numeric values are ignored and the default is kept.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("STASHD_LISTEN") {
            config.listen = v;
        }
        if let Ok(v) = std::env::var("STASHD_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse() {
                config.request_timeout_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("STASHD_MAX_BODY_SIZE") {
            if let Ok(bytes) = v.parse() {
                config.max_body_size = bytes;
            }
        }
        if let Ok(v) = std::env::var("STASHD_ROOT") {
            config.storage_root = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The request deadline as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
