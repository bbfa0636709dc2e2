//! Secret handling and redaction
//!
//! MCP servers carry connection tokens. They travel inside [`SecretString`]
//! so `Debug`/`Display` never print them, and request bodies pass through
//! [`redact_value`] before being logged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// A connection token that never shows up in `Debug` or `Display` output
///
/// Serializes as the plain string, so request bodies still carry it.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

const SENSITIVE_PATTERNS: [&str; 6] = [
    "token",
    "secret",
    "password",
    "credential",
    "authorization",
    "api_key",
];

/// Whether a field name looks like it holds a secret
pub fn is_sensitive_field(field_name: &str) -> bool {
    let field_lower = field_name.to_lowercase();
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| field_lower.contains(pattern))
}

/// Copy of a JSON value with sensitive fields masked, for logging
pub fn redact_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| {
                    let masked = if is_sensitive_field(key) && !v.is_null() {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_value(v)
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        other => other.clone(),
    }
}
