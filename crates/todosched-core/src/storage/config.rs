//! TOML-based application configuration.
//!
//! Holds:
//! - Todoist API credentials, base URL and request timeout
//! - HTTP server bind address
//! - Import defaults (timezone)
//! - Free-slot defaults (workday window, minimum slot length)
//!
//! Configuration is stored at `~/.config/todosched/config.toml` unless a
//! path is given explicitly.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::integrations::todoist::DEFAULT_BASE_URL;
use crate::time;
use crate::timeline::MAX_MIN_SLOT_MINUTES;

/// Environment variable that overrides `todoist.api_token`.
pub const TOKEN_ENV: &str = "TODOIST_API_TOKEN";

/// Todoist connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoistConfig {
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Import defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

/// Free-slot defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSlotsConfig {
    #[serde(default = "default_workday_start")]
    pub workday_start: String,
    #[serde(default = "default_workday_end")]
    pub workday_end: String,
    #[serde(default = "default_min_slot_minutes")]
    pub min_slot_minutes: i64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/todosched/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub todoist: TodoistConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub free_slots: FreeSlotsConfig,
}

// Default functions
fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_bind() -> String {
    "127.0.0.1:8000".into()
}
fn default_timezone() -> String {
    time::DEFAULT_TIMEZONE.into()
}
fn default_workday_start() -> String {
    "08:00".into()
}
fn default_workday_end() -> String {
    "23:00".into()
}
fn default_min_slot_minutes() -> i64 {
    30
}

impl Default for TodoistConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
        }
    }
}

impl Default for FreeSlotsConfig {
    fn default() -> Self {
        Self {
            workday_start: default_workday_start(),
            workday_end: default_workday_end(),
            min_slot_minutes: default_min_slot_minutes(),
        }
    }
}

fn invalid(key: &str, message: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(key, e))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<i64>()
                            .map_err(|_| invalid(key, format!("cannot parse '{value}' as integer")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(key, e))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/todosched"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, writing defaults there if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if the defaults cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Apply environment overrides. Only the API token is overridable.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            self.todoist.api_token = token;
        }
        self
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The result is validated; nothing is saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value has the wrong type,
    /// or the resulting config fails [`Config::validate`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| invalid(key, e))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check every value that is parsed lazily elsewhere.
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.todoist.base_url).map_err(|e| invalid("todoist.base_url", e))?;
        if self.todoist.timeout_secs == 0 {
            return Err(invalid("todoist.timeout_secs", "must be positive"));
        }
        self.bind_addr()?;
        self.default_timezone()?;
        self.workday()?;
        let min_slot = self.free_slots.min_slot_minutes;
        if !(0..=MAX_MIN_SLOT_MINUTES).contains(&min_slot) {
            return Err(invalid(
                "free_slots.min_slot_minutes",
                format!("must be between 0 and {MAX_MIN_SLOT_MINUTES}, got {min_slot}"),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|e| invalid("server.bind", e))
    }

    pub fn default_timezone(&self) -> Result<Tz, ConfigError> {
        time::parse_timezone("import.default_timezone", &self.import.default_timezone)
            .map_err(|e| invalid("import.default_timezone", e))
    }

    /// Workday window as `(start, end)`; start must be before end.
    pub fn workday(&self) -> Result<(NaiveTime, NaiveTime), ConfigError> {
        let start = time::parse_time_of_day("workday_start", &self.free_slots.workday_start)
            .map_err(|e| invalid("free_slots.workday_start", e))?;
        let end = time::parse_time_of_day("workday_end", &self.free_slots.workday_end)
            .map_err(|e| invalid("free_slots.workday_end", e))?;
        if end <= start {
            return Err(invalid(
                "free_slots.workday_end",
                "must be later than workday_start",
            ));
        }
        Ok((start, end))
    }
}
