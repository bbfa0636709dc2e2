//! Configuration errors

use std::path::Path;
use thiserror::Error;

/// Failure to load, parse, edit or save a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot access config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in '{path}' (line {}, column {}): {message}",
            .line.unwrap_or(0), .column.unwrap_or(0))]
    Parse {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("Failed to serialize configuration: {message}")]
    Serialize { message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Environment variable '{var}' referenced in config is not set")]
    MissingEnvVar { var: String },

    #[error("Invalid value for environment variable '{var}': {message}")]
    InvalidEnvVar { var: String, message: String },

    #[error("Unknown configuration key '{key}'")]
    UnknownKey { key: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// A rule violated by a configuration value
#[derive(Debug, Error)]
#[error("Invalid configuration at '{field_path}': {kind}{}", .context.as_ref().map(|c| format!(" ({})", c)).unwrap_or_default())]
pub struct ValidationError {
    /// Dot path of the offending field, e.g. `api.base_url`
    pub field_path: String,
    pub kind: ValidationErrorKind,
    pub context: Option<String>,
}

#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("required field is missing")]
    RequiredFieldMissing,

    #[error("expected {expected}, got {actual}")]
    InvalidValue { expected: String, actual: String },

    #[error("out of range, {message}")]
    OutOfRange { message: String },

    #[error("invalid URL, {message}")]
    InvalidUrl { message: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::RequiredFieldMissing)
    }

    pub fn invalid_value(
        field_path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let kind = ValidationErrorKind::InvalidValue {
            expected: expected.into(),
            actual: actual.into(),
        };
        Self::new(field_path, kind)
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        let kind = ValidationErrorKind::OutOfRange {
            message: message.into(),
        };
        Self::new(field_path, kind)
    }

    pub fn invalid_url(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        let kind = ValidationErrorKind::InvalidUrl {
            message: message.into(),
        };
        Self::new(field_path, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_includes_context() {
        let err = ValidationError::invalid_url("api.base_url", "relative URL without a base")
            .with_context("got 'localhost'");
        assert_eq!(
            err.to_string(),
            "Invalid configuration at 'api.base_url': invalid URL, relative URL without a base (got 'localhost')"
        );

        let bare = ValidationError::required("version");
        assert_eq!(
            bare.to_string(),
            "Invalid configuration at 'version': required field is missing"
        );
    }
}
