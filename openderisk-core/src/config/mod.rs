//! Configuration module
//!
//! Configuration is layered: built-in defaults, then the first YAML file
//! found (explicit path or the search list), then `OPENDERISK_*`
//! environment variables. The client core only consumes the resolved
//! [`ApiConfig`].

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::{apply_env_overrides, BASE_URL_VAR, OUTPUT_FORMAT_VAR, TIMEOUT_VAR};
pub use error::{ConfigError, ValidationError, ValidationErrorKind};
pub use schema::{
    parse_config_value, ApiConfig, DefaultsConfig, LoggingConfig, OpenDeriskConfig, OutputFormat,
};
pub use secrets::{is_sensitive_field, redact_value, SecretString};
pub use validator::ConfigValidator;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_DIR: &str = ".openderisk";

/// Project-local config file (`./.openderisk/config.yaml`)
pub fn local_config_path() -> PathBuf {
    Path::new(CONFIG_DIR).join("config.yaml")
}

/// Per-user config file (`~/.openderisk/config.yaml`)
pub fn global_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(CONFIG_DIR).join("config.yaml"))
}

/// Files searched, in order, when no explicit path is given
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        Path::new(CONFIG_DIR).join("config.yaml"),
        Path::new(CONFIG_DIR).join("config.yml"),
    ];
    if let Some(home) = home_dir() {
        paths.push(home.join(CONFIG_DIR).join("config.yaml"));
        paths.push(home.join(CONFIG_DIR).join("config.yml"));
    }
    paths
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<OpenDeriskConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;

    let interpolated = env::interpolate_env_vars(&content)?;

    // An empty file is a valid, all-defaults configuration
    if interpolated.trim().is_empty() {
        return Ok(OpenDeriskConfig::default());
    }

    serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        line: e.location().map(|l| l.line()),
        column: e.location().map(|l| l.column()),
        message: e.to_string(),
    })
}

/// Load configuration without environment overrides
///
/// An explicit path that does not exist yields defaults, as does finding
/// no file in the search list.
pub fn load(path: Option<&Path>) -> Result<OpenDeriskConfig, ConfigError> {
    if let Some(path) = path {
        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            return load_from_yaml(path);
        }
        debug!("{} does not exist, using defaults", path.display());
        return Ok(OpenDeriskConfig::default());
    }

    for candidate in default_search_paths() {
        if candidate.exists() {
            debug!("Loading configuration from {}", candidate.display());
            return load_from_yaml(candidate);
        }
    }

    Ok(OpenDeriskConfig::default())
}

/// Resolve the effective configuration: file, then environment, then validation
pub fn get_config(path: Option<&Path>) -> Result<OpenDeriskConfig, ConfigError> {
    let mut config = load(path)?;
    apply_env_overrides(&mut config)?;
    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Write a configuration as YAML, creating parent directories
pub fn save_config<P: AsRef<Path>>(config: &OpenDeriskConfig, path: P) -> Result<(), ConfigError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }

    let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::Serialize {
        message: e.to_string(),
    })?;

    fs::write(path, yaml).map_err(|e| ConfigError::io(path, e))?;
    debug!("Saved configuration to {}", path.display());
    Ok(())
}
