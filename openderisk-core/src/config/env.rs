//! Environment variable handling for configuration
//!
//! Two layers: `${VAR}` placeholders inside the YAML file are interpolated
//! before parsing, then the `OPENDERISK_*` variables override the parsed
//! values.

use super::error::ConfigError;
use super::schema::OpenDeriskConfig;
use regex::Regex;
use std::env;
use std::sync::LazyLock;
use tracing::debug;

pub const BASE_URL_VAR: &str = "OPENDERISK_BASE_URL";
pub const TIMEOUT_VAR: &str = "OPENDERISK_TIMEOUT";
pub const OUTPUT_FORMAT_VAR: &str = "OPENDERISK_OUTPUT_FORMAT";

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Interpolate `${VAR}` placeholders in a configuration string
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = content.to_string();
    let mut missing_vars = Vec::new();

    for cap in ENV_VAR_PATTERN.captures_iter(content) {
        let full_match = &cap[0];
        let var_name = &cap[1];

        match env::var(var_name) {
            Ok(value) => {
                result = result.replace(full_match, &value);
            }
            Err(_) => {
                missing_vars.push(var_name.to_string());
            }
        }
    }

    if let Some(var) = missing_vars.into_iter().next() {
        return Err(ConfigError::MissingEnvVar { var });
    }

    Ok(result)
}

/// Apply `OPENDERISK_*` overrides on top of a loaded configuration
pub fn apply_env_overrides(config: &mut OpenDeriskConfig) -> Result<(), ConfigError> {
    if let Some(base_url) = non_empty_var(BASE_URL_VAR) {
        debug!("{} overrides api.base_url", BASE_URL_VAR);
        config.api.base_url = base_url;
    }

    if let Some(timeout) = non_empty_var(TIMEOUT_VAR) {
        config.api.timeout = timeout
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnvVar {
                var: TIMEOUT_VAR.to_string(),
                message: e.to_string(),
            })?;
    }

    if let Some(format) = non_empty_var(OUTPUT_FORMAT_VAR) {
        config.defaults.output_format =
            format
                .parse()
                .map_err(|e: ConfigError| ConfigError::InvalidEnvVar {
                    var: OUTPUT_FORMAT_VAR.to_string(),
                    message: e.to_string(),
                })?;
    }

    Ok(())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}
