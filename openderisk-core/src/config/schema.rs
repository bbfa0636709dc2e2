//! Configuration schema structures with serde support

use super::error::{ConfigError, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenDeriskConfig {
    /// Schema version
    pub version: String,

    /// Platform connection settings
    pub api: ApiConfig,

    /// CLI defaults
    pub defaults: DefaultsConfig,

    pub logging: LoggingConfig,
}

impl Default for OpenDeriskConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            api: ApiConfig::default(),
            defaults: DefaultsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Platform connection settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the OpenDerisk platform
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout: u64,

    /// Attempts for idempotent requests that fail to connect
    pub retry_max_attempts: u32,

    /// Backoff factor in seconds between those attempts
    pub retry_backoff_factor: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7777".to_string(),
            timeout: 30,
            retry_max_attempts: 3,
            retry_backoff_factor: 0.5,
        }
    }
}

/// How the CLI prints results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per item
    #[default]
    #[serde(alias = "table")]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "table" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::Invalid {
                message: format!("unsupported output format '{}'", other),
            }),
        }
    }
}

/// CLI defaults
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub output_format: OutputFormat,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when neither `-v` nor `RUST_LOG` is given
    pub level: String,
    pub file: String,
    pub max_size: String,
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "~/.openderisk/logs/openderisk-cli.log".to_string(),
            max_size: "10MB".to_string(),
            max_files: 5,
        }
    }
}

pub(crate) const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl OpenDeriskConfig {
    /// Built-in validation of the schema
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.trim().is_empty() {
            return Err(ValidationError::required("version"));
        }

        if self.api.timeout == 0 {
            return Err(ValidationError::out_of_range(
                "api.timeout",
                "timeout must be greater than 0",
            ));
        }

        if !self.api.retry_backoff_factor.is_finite() || self.api.retry_backoff_factor < 0.0 {
            return Err(ValidationError::out_of_range(
                "api.retry_backoff_factor",
                "backoff factor must be a non-negative number",
            ));
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ValidationError::invalid_value(
                "logging.level",
                LOG_LEVELS.join("|"),
                &self.logging.level,
            ));
        }

        Ok(())
    }

    /// Look up a value by dot-notation key (e.g. `api.base_url`)
    pub fn get(&self, key: &str) -> Option<Value> {
        let tree = serde_json::to_value(self).ok()?;
        key.split('.')
            .try_fold(&tree, |node, part| node.get(part))
            .cloned()
    }

    /// Set a value by dot-notation key; the key must already exist in the schema
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        let mut tree = serde_json::to_value(&*self).map_err(|e| ConfigError::Serialize {
            message: e.to_string(),
        })?;

        let slot = key
            .split('.')
            .try_fold(&mut tree, |node, part| node.get_mut(part))
            .ok_or_else(|| ConfigError::UnknownKey {
                key: key.to_string(),
            })?;
        *slot = value;

        *self = serde_json::from_value(tree).map_err(|e| ConfigError::Invalid {
            message: format!("invalid value for '{}': {}", key, e),
        })?;
        Ok(())
    }

    /// Set a value from command-line text, keeping it a string where the schema expects one
    pub fn set_from_str(&mut self, key: &str, raw: &str) -> Result<Value, ConfigError> {
        let value = match self.get(key) {
            Some(Value::String(_)) => Value::String(raw.to_string()),
            Some(_) => parse_config_value(raw),
            None => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                })
            }
        };
        self.set(key, value.clone())?;
        Ok(value)
    }
}

/// Interpret command-line text as an integer, float, boolean or string, in that order
pub fn parse_config_value(raw: &str) -> Value {
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        if float.is_finite() {
            return Value::from(float);
        }
    }
    match raw.to_lowercase().as_str() {
        "true" | "yes" => Value::Bool(true),
        "false" | "no" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}
