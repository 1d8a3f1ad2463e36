//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Tick cadence for the foreground service
//! - Notification preferences
//!
//! Configuration is stored at `{data_dir}/config.toml` and written with
//! defaults on first run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::storage::data_dir;

/// Tick loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickConfig {
    /// Seconds between periodic ticks. The engine assumes ~1 Hz; raising
    /// this slows the countdown accordingly.
    #[serde(default = "default_tick_secs")]
    pub interval_secs: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `{data_dir}/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tick: TickConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_tick_secs() -> u64 {
    1
}
fn default_true() -> bool {
    true
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_tick_secs(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick: TickConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the default config on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed
    /// into the existing type, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save()
    }
}

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
    if parts.peek().is_none() {
        return Err(unknown());
    }

    let mut current = root;
    while let Some(part) = parts.next() {
        let is_leaf = parts.peek().is_none();
        if is_leaf {
            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: e.to_string(),
                    })?,
                ),
                serde_json::Value::Number(_) => {
                    let n = value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: format!("cannot parse '{value}' as number"),
                    })?;
                    serde_json::Value::Number(n.into())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_one_hz_with_notifications() {
        let cfg = Config::default();
        assert_eq!(cfg.tick.interval_secs, 1);
        assert!(cfg.notifications.enabled);
    }

    #[test]
    fn toml_round_trip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.tick.interval_secs, cfg.tick.interval_secs);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str("[notifications]\nenabled = false\n").unwrap();
        assert!(!cfg.notifications.enabled);
        assert_eq!(cfg.tick.interval_secs, 1);
    }

    #[test]
    fn dot_path_get() {
        let cfg = Config::default();
        assert_eq!(cfg.get("tick.interval_secs").as_deref(), Some("1"));
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert!(cfg.get("no.such.key").is_none());
    }

    #[test]
    fn dot_path_set_parses_into_existing_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        set_json_value_by_path(&mut json, "tick.interval_secs", "5").unwrap();
        let cfg: Config = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.tick.interval_secs, 5);

        let mut json = serde_json::to_value(Config::default()).unwrap();
        assert!(set_json_value_by_path(&mut json, "tick.interval_secs", "abc").is_err());
        assert!(set_json_value_by_path(&mut json, "bogus.key", "1").is_err());
    }
}
