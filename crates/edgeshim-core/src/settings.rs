//! Process-wide settings, loaded once at startup and shared read-only.
//!
//! ```json
//! {
//!   "name": "Rynn UI",
//!   "apiSettings": { "operator": "Created Using Rynn UI" },
//!   "logging": { "level": "info", "echo_stdout": true },
//!   "server": { "addr": "127.0.0.1:8787", "web_root": "web" }
//! }
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use log::LevelFilter;
use serde::Deserialize;
use validator::Validate;

/// Operator name injected into JSON API responses when none is configured.
pub const DEFAULT_OPERATOR: &str = "Created Using Rynn UI";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

pub struct SettingsLoader {
    settings: Arc<Settings>,
}

impl SettingsLoader {
    pub fn load_from_str(contents: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(contents)?;
        settings.validate()?;
        Ok(Self {
            settings: Arc::new(settings),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn shared(&self) -> Arc<Settings> {
        Arc::clone(&self.settings)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct Settings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "apiSettings")]
    #[validate(nested)]
    pub api_settings: ApiSettings,
    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingSettings,
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerSettings,
}

impl Settings {
    /// Operator display name, falling back to [`DEFAULT_OPERATOR`] when unset or empty.
    pub fn operator(&self) -> &str {
        self.api_settings
            .operator
            .as_deref()
            .filter(|operator| !operator.is_empty())
            .unwrap_or(DEFAULT_OPERATOR)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct ApiSettings {
    #[serde(default)]
    pub operator: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct LoggingSettings {
    #[serde(default)]
    pub level: Option<LogLevel>,
    #[serde(default)]
    pub echo_stdout: Option<bool>,
}

impl LoggingSettings {
    /// Effective filter: the configured level, or `Off` when stdout echo is disabled.
    pub fn level_filter(&self) -> LevelFilter {
        if self.echo_stdout == Some(false) {
            return LevelFilter::Off;
        }
        self.level.unwrap_or_default().into()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct ServerSettings {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub addr: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub web_root: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Off => "off",
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "off" => Ok(Self::Off),
            other => Err(serde::de::Error::custom(format!(
                "logging level must be trace, debug, info, warn, error, or off (got `{}`)",
                other
            ))),
        }
    }
}
