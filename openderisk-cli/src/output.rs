//! Printing command results as text lines or pretty JSON

use anyhow::Result;
use openderisk_core::config::OutputFormat;
use serde::Serialize;

/// Print `value` as pretty JSON, or through `text` for the line format
pub fn emit<T, F>(format: OutputFormat, value: &T, text: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> Vec<String>,
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => {
            for line in text(value) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

/// `label: value` when the value is present
pub fn field(label: &str, value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| format!("  {}: {}", label, v))
}

/// Fallback line for an empty listing
pub fn empty(what: &str) -> Vec<String> {
    vec![format!("No {} found", what)]
}
