//! Configuration validation utilities

use super::error::ValidationError;
use super::schema::OpenDeriskConfig;
use url::Url;

/// Configuration validator with rules beyond the schema's own checks
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &OpenDeriskConfig) -> Result<(), ValidationError> {
        config.validate()?;
        self.validate_base_url(&config.api.base_url)?;
        Ok(())
    }

    fn validate_base_url(&self, base_url: &str) -> Result<(), ValidationError> {
        let url = Url::parse(base_url).map_err(|e| {
            ValidationError::invalid_url("api.base_url", e.to_string())
                .with_context(format!("got '{}'", base_url))
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ValidationError::invalid_url(
                    "api.base_url",
                    format!("unsupported scheme '{}', expected http or https", other),
                ))
            }
        }

        if url.host_str().is_none() {
            return Err(ValidationError::invalid_url(
                "api.base_url",
                "URL has no host",
            ));
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(ValidationError::invalid_url(
                "api.base_url",
                "base URL must not carry a query or fragment",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn config_with_url(url: &str) -> OpenDeriskConfig {
        let mut config = OpenDeriskConfig::default();
        config.api.base_url = url.to_string();
        config
    }

    #[test_case("http://localhost:7777" ; "local http")]
    #[test_case("https://derisk.example.com/prefix/" ; "https with path")]
    fn test_accepts_http_urls(url: &str) {
        assert!(ConfigValidator::new().validate(&config_with_url(url)).is_ok());
    }

    #[test_case("localhost:7777" ; "missing scheme")]
    #[test_case("ftp://example.com" ; "wrong scheme")]
    #[test_case("http://example.com/?a=1" ; "query string")]
    #[test_case("not a url" ; "garbage")]
    fn test_rejects_bad_urls(url: &str) {
        let err = ConfigValidator::new()
            .validate(&config_with_url(url))
            .unwrap_err();
        assert_eq!(err.field_path, "api.base_url");
    }

    #[test]
    fn test_runs_schema_validation_first() {
        let mut config = OpenDeriskConfig::default();
        config.logging.level = "loud".to_string();
        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert_eq!(err.field_path, "logging.level");
    }
}
