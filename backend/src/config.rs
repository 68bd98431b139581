//! Engine configuration file and environment support.
//!
//! Configuration is read from a TOML file (all sections optional) and can
//! then be overridden from environment variables:
//!
//! ```toml
//! user_id = 42
//!
//! [service]
//! type = "http"
//! base_url = "https://planner.example.edu/api"
//! request_timeout_secs = 20
//!
//! [sync]
//! idle_threshold_secs = 10
//! watchdog_interval_ms = 1000
//! cache_ttl_secs = 30
//!
//! [notifications]
//! capacity = 50
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::UserId;
use crate::remote::ServiceType;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("No schedule-sync.toml found in standard locations")]
    NotFound,
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_user_id")]
    pub user_id: UserId,
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// Which schedule service to talk to and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(rename = "type", default = "default_service_type")]
    pub service_type: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Timing of the synchronization controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Pending operations older than this force a full refresh.
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_secs: u64,
    #[serde(default = "default_watchdog_interval")]
    pub watchdog_interval_ms: u64,
    /// How long a fetched grid may be served without refetching. 0 disables caching.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_notification_capacity")]
    pub capacity: usize,
}

fn default_user_id() -> UserId {
    UserId::new(1)
}

fn default_service_type() -> String {
    "local".to_string()
}

fn default_request_timeout() -> u64 {
    20
}

fn default_idle_threshold() -> u64 {
    10
}

fn default_watchdog_interval() -> u64 {
    1000
}

fn default_cache_ttl() -> u64 {
    30
}

fn default_notification_capacity() -> usize {
    50
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            service: ServiceSettings::default(),
            sync: SyncSettings::default(),
            notifications: NotificationSettings::default(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            service_type: default_service_type(),
            base_url: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            idle_threshold_secs: default_idle_threshold(),
            watchdog_interval_ms: default_watchdog_interval(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            capacity: default_notification_capacity(),
        }
    }
}

impl SyncSettings {
    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_secs)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms.max(1))
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

impl ServiceSettings {
    pub fn service_type(&self) -> Result<ServiceType, ConfigError> {
        self.service_type
            .parse()
            .map_err(|message| ConfigError::InvalidValue {
                key: "service.type".to_string(),
                message,
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `schedule-sync.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("schedule-sync.toml"),
            PathBuf::from("backend/schedule-sync.toml"),
            PathBuf::from("../schedule-sync.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::NotFound)
    }

    /// Apply environment overrides.
    ///
    /// # Environment Variables
    /// - `SCHEDULE_SERVICE_TYPE`: `local` | `http`
    /// - `SCHEDULE_SERVICE_URL`: base URL of the remote service; selects `http`
    ///   unless `SCHEDULE_SERVICE_TYPE` is set
    /// - `SCHEDULE_USER_ID`: id of the student whose plan is loaded
    /// - `SCHEDULE_IDLE_THRESHOLD_SECS`: watchdog idle threshold
    pub fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        let explicit_type = env::var("SCHEDULE_SERVICE_TYPE").ok();
        if let Ok(value) = env::var("SCHEDULE_SERVICE_URL") {
            self.service.base_url = value;
            // A service URL alone selects the REST client.
            if explicit_type.is_none() {
                self.service.service_type = "http".to_string();
            }
        }
        if let Some(value) = explicit_type {
            self.service.service_type = value;
            self.service.service_type()?;
        }
        if let Ok(value) = env::var("SCHEDULE_USER_ID") {
            let id = value.parse::<i64>().map_err(|e| ConfigError::InvalidValue {
                key: "SCHEDULE_USER_ID".to_string(),
                message: e.to_string(),
            })?;
            self.user_id = UserId::new(id);
        }
        if let Ok(value) = env::var("SCHEDULE_IDLE_THRESHOLD_SECS") {
            self.sync.idle_threshold_secs =
                value.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                    key: "SCHEDULE_IDLE_THRESHOLD_SECS".to_string(),
                    message: e.to_string(),
                })?;
        }
        Ok(self)
    }

    /// Default-location file if present, otherwise defaults; env overrides applied last.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match Self::from_default_location() {
            Ok(config) => config,
            Err(ConfigError::NotFound) => Self::default(),
            Err(e) => return Err(e),
        };
        base.apply_env_overrides()
    }
}
