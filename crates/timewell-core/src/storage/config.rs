//! TOML-based application configuration.
//!
//! Stores the day rollover hour and the default pomodoro configuration.
//! Configuration is stored at `~/.config/timewell/config.toml`; every
//! field has a serde default so a partial file loads cleanly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::daykey::RolloverHour;
use crate::error::ConfigError;
use crate::pomodoro::PomodoroConfig;

/// Day bucketing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayConfig {
    /// Local hour before which activity belongs to the previous day.
    #[serde(default)]
    pub rollover_hour: RolloverHour,
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            rollover_hour: RolloverHour::MIDNIGHT,
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/timewell/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub day: DayConfig,
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: "~/.config/timewell".into(),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing defaults on first run.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// holds invalid values, or if the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Parse and validate TOML content.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let cfg: Config =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.pomodoro
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: "pomodoro".to_string(),
                message: e.to_string(),
            })?;
        Ok(cfg)
    }

    /// Persist to disk.
    ///
    /// # Errors
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

    pub fn rollover_hour(&self) -> RolloverHour {
        self.day.rollover_hour
    }

    /// Get a config value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "day.rollover_hour" => Some(self.day.rollover_hour.get().to_string()),
            "pomodoro.work_secs" => Some(self.pomodoro.work_secs.to_string()),
            "pomodoro.short_break_secs" => Some(self.pomodoro.short_break_secs.to_string()),
            "pomodoro.long_break_secs" => Some(self.pomodoro.long_break_secs.to_string()),
            "pomodoro.sessions_before_long_break" => {
                Some(self.pomodoro.sessions_before_long_break.to_string())
            }
            "pomodoro.auto_start_breaks" => Some(self.pomodoro.auto_start_breaks.to_string()),
            "pomodoro.auto_start_work" => Some(self.pomodoro.auto_start_work.to_string()),
            _ => None,
        }
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value does not parse or
    /// validate, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        match key {
            "day.rollover_hour" => {
                let hour: u8 = value.parse().map_err(|_| invalid("not an hour".into()))?;
                self.day.rollover_hour =
                    RolloverHour::new(hour).map_err(|e| invalid(e.to_string()))?;
            }
            "pomodoro.work_secs" => {
                self.pomodoro.work_secs =
                    value.parse().map_err(|_| invalid("not a number".into()))?;
            }
            "pomodoro.short_break_secs" => {
                self.pomodoro.short_break_secs =
                    value.parse().map_err(|_| invalid("not a number".into()))?;
            }
            "pomodoro.long_break_secs" => {
                self.pomodoro.long_break_secs =
                    value.parse().map_err(|_| invalid("not a number".into()))?;
            }
            "pomodoro.sessions_before_long_break" => {
                self.pomodoro.sessions_before_long_break =
                    value.parse().map_err(|_| invalid("not a number".into()))?;
            }
            "pomodoro.auto_start_breaks" => {
                self.pomodoro.auto_start_breaks =
                    value.parse().map_err(|_| invalid("not a bool".into()))?;
            }
            "pomodoro.auto_start_work" => {
                self.pomodoro.auto_start_work =
                    value.parse().map_err(|_| invalid("not a bool".into()))?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        self.pomodoro
            .validate()
            .map_err(|e| invalid(e.to_string()))?;
        self.save()
    }
}
