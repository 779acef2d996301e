//! Typed configuration, loaded from a TOML file on disk with
//! `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` environment overrides layered on
//! top, following the same env-wins-over-file convention common to HTTP
//! client ecosystems.

use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, #[source] source: toml::de::Error },

    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

fn default_update_poll_interval_seconds() -> u64 {
    1800
}
fn default_inventory_poll_interval_seconds() -> u64 {
    28_800
}
fn default_retry_poll_interval_seconds() -> u64 {
    300
}
fn default_retry_poll_count() -> u32 {
    10
}
fn default_state_script_timeout_seconds() -> u64 {
    3600
}
fn default_state_script_retry_interval_seconds() -> u64 {
    60
}
fn default_state_script_retry_timeout_seconds() -> u64 {
    600
}
fn default_module_timeout_seconds() -> u64 {
    14_400
}
fn default_state_data_store_count_cap() -> u32 {
    30
}

/// Everything every other component is constructed from. Loaded once at
/// startup by the CLI layer and shared by reference (or cheap clone) after
/// that -- never a process-wide singleton, per the "context value passed
/// explicitly" design note.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server_url: Option<String>,
    pub server_certificate: Option<String>,
    pub client_certificate: Option<String>,
    pub client_certificate_key: Option<String>,
    #[serde(default)]
    pub skip_verify: bool,
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub no_proxy: Option<String>,
    #[serde(default)]
    pub disable_keep_alive: bool,
    #[serde(default)]
    pub artifact_verify_keys: Vec<String>,

    #[serde(default = "default_update_poll_interval_seconds")]
    pub update_poll_interval_seconds: u64,
    #[serde(default = "default_inventory_poll_interval_seconds")]
    pub inventory_poll_interval_seconds: u64,
    #[serde(default = "default_retry_poll_interval_seconds")]
    pub retry_poll_interval_seconds: u64,
    #[serde(default = "default_retry_poll_count")]
    pub retry_poll_count: u32,

    #[serde(default = "default_state_script_timeout_seconds")]
    pub state_script_timeout_seconds: u64,
    #[serde(default = "default_state_script_retry_interval_seconds")]
    pub state_script_retry_interval_seconds: u64,
    #[serde(default = "default_state_script_retry_timeout_seconds")]
    pub state_script_retry_timeout_seconds: u64,

    #[serde(default = "default_module_timeout_seconds")]
    pub module_timeout_seconds: u64,

    #[serde(default = "default_state_data_store_count_cap")]
    pub state_data_store_count_cap: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: None,
            server_certificate: None,
            client_certificate: None,
            client_certificate_key: None,
            skip_verify: false,
            http_proxy: None,
            https_proxy: None,
            no_proxy: None,
            disable_keep_alive: false,
            artifact_verify_keys: Vec::new(),
            update_poll_interval_seconds: default_update_poll_interval_seconds(),
            inventory_poll_interval_seconds: default_inventory_poll_interval_seconds(),
            retry_poll_interval_seconds: default_retry_poll_interval_seconds(),
            retry_poll_count: default_retry_poll_count(),
            state_script_timeout_seconds: default_state_script_timeout_seconds(),
            state_script_retry_interval_seconds: default_state_script_retry_interval_seconds(),
            state_script_retry_timeout_seconds: default_state_script_retry_timeout_seconds(),
            module_timeout_seconds: default_module_timeout_seconds(),
            state_data_store_count_cap: default_state_data_store_count_cap(),
        }
    }
}

impl Config {
    /// Loads `path` if it exists (a missing file is not an error, every
    /// field has a default or is optional), then layers environment proxy
    /// overrides on top, then validates.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str::<Config>(&contents)
                .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(source) => return Err(ConfigError::Io { path: path.display().to_string(), source }),
        };
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("HTTP_PROXY") {
            self.http_proxy = Some(v);
        }
        if let Ok(v) = env::var("HTTPS_PROXY") {
            self.https_proxy = Some(v);
        }
        if let Ok(v) = env::var("NO_PROXY") {
            self.no_proxy = Some(v);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_poll_count < 1 {
            return Err(ConfigError::InvalidValue {
                field: "retry_poll_count",
                reason: "must be >= 1".into(),
            });
        }
        for (field, value) in [
            ("update_poll_interval_seconds", self.update_poll_interval_seconds),
            ("inventory_poll_interval_seconds", self.inventory_poll_interval_seconds),
            ("retry_poll_interval_seconds", self.retry_poll_interval_seconds),
            ("state_script_timeout_seconds", self.state_script_timeout_seconds),
            ("module_timeout_seconds", self.module_timeout_seconds),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue { field, reason: "must be > 0".into() });
            }
        }
        Ok(())
    }

    /// The clamped floor for the poll backoff: the smallest retry interval
    /// never exceeds the configured base interval, so a degenerate
    /// configuration collapses to a sensible fixed interval instead of
    /// polling faster under failure than under success.
    pub fn clamped_retry_poll_interval(&self, base_interval_seconds: u64) -> u64 {
        self.retry_poll_interval_seconds.min(base_interval_seconds.max(1))
    }

    pub fn require_server_url(&self) -> Result<&str, ConfigError> {
        self.server_url.as_deref().ok_or(ConfigError::MissingRequiredField("server_url"))
    }
}
