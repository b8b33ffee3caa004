//! Layered configuration: defaults, then an optional TOML file, then
//! `ARGUE_*` environment variables, then CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reconciler::signals::DEFAULT_REACTION_CAPACITY;
use reconciler::EngineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "argue-watch.toml";

pub const ENV_API_URL: &str = "ARGUE_API_URL";
pub const ENV_USER_ID: &str = "ARGUE_USER_ID";
pub const ENV_USER_HANDLE: &str = "ARGUE_USER_HANDLE";
pub const ENV_AUDIENCE_TOKEN: &str = "ARGUE_AUDIENCE_TOKEN";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "ARGUE_REQUEST_TIMEOUT_SECS";
pub const ENV_REACTION_CAPACITY: &str = "ARGUE_REACTION_CAPACITY";
pub const ENV_REFRESH_REPORT_ON_READY: &str = "ARGUE_REFRESH_REPORT_ON_READY";

/// Handle used for synthesized spectator identities.
pub const GUEST_HANDLE: &str = "spectator";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("no user id configured (set ARGUE_USER_ID or --user-id, or pass an audience token)")]
    MissingIdentity,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for one watch client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Base URL of the upstream API (`http://` or `https://`).
    pub api_url: String,
    pub user_id: Option<String>,
    pub user_handle: Option<String>,
    /// Spectator token; grants read access without a participant seat.
    pub audience_token: Option<String>,
    pub request_timeout_secs: u64,
    pub reaction_capacity: usize,
    /// Issue an explicit report refresh when upstream announces the report
    /// as ready after an earlier fetch came back empty.
    pub refresh_report_on_ready: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".into(),
            user_id: None,
            user_handle: None,
            audience_token: None,
            request_timeout_secs: 15,
            reaction_capacity: DEFAULT_REACTION_CAPACITY,
            refresh_report_on_ready: true,
        }
    }
}

/// Identity sent with every upstream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub handle: String,
    /// Synthesized for a spectator with no user id of their own.
    pub guest: bool,
}

/// Values supplied on the command line. `None` leaves the lower layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub user_id: Option<String>,
    pub user_handle: Option<String>,
    pub audience_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl WatchConfig {
    /// Defaults, then the file at `path` (or [`DEFAULT_CONFIG_FILE`] when it
    /// exists), then the process environment.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay environment values read through `lookup`. Blank values are
    /// treated as unset.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(user_id) = get(ENV_USER_ID) {
            self.user_id = Some(user_id);
        }
        if let Some(handle) = get(ENV_USER_HANDLE) {
            self.user_handle = Some(handle);
        }
        if let Some(token) = get(ENV_AUDIENCE_TOKEN) {
            self.audience_token = Some(token);
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_number(ENV_REQUEST_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = get(ENV_REACTION_CAPACITY) {
            self.reaction_capacity = parse_number(ENV_REACTION_CAPACITY, &raw)?;
        }
        if let Some(raw) = get(ENV_REFRESH_REPORT_ON_READY) {
            self.refresh_report_on_ready = parse_bool(ENV_REFRESH_REPORT_ON_READY, &raw)?;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.api_url {
            self.api_url = url;
        }
        if overrides.user_id.is_some() {
            self.user_id = overrides.user_id;
        }
        if overrides.user_handle.is_some() {
            self.user_handle = overrides.user_handle;
        }
        if overrides.audience_token.is_some() {
            self.audience_token = overrides.audience_token;
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let url = self.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "api_url",
                value: self.api_url.clone(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                value: "0".into(),
            });
        }
        if self.reaction_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "reaction_capacity",
                value: "0".into(),
            });
        }
        Ok(())
    }

    /// Resolve who requests are made as. Without a user id, an audience
    /// token yields a one-off guest identity.
    pub fn identity(&self) -> ConfigResult<Identity> {
        match (&self.user_id, &self.audience_token) {
            (Some(user_id), _) => Ok(Identity {
                user_id: user_id.clone(),
                handle: self
                    .user_handle
                    .clone()
                    .unwrap_or_else(|| default_handle(user_id)),
                guest: false,
            }),
            (None, Some(_)) => Ok(Identity {
                user_id: format!("guest-{}", uuid::Uuid::new_v4()),
                handle: GUEST_HANDLE.to_string(),
                guest: true,
            }),
            (None, None) => Err(ConfigError::MissingIdentity),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            reaction_capacity: self.reaction_capacity,
        }
    }

    /// API base without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_url.trim().trim_end_matches('/')
    }
}

/// Upstream's fallback handle for a user who never picked one.
fn default_handle(user_id: &str) -> String {
    let prefix: String = user_id.chars().take(6).collect();
    format!("user-{prefix}")
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> ConfigResult<T> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
