//! Response envelope shared by every OpenDerisk endpoint
//!
//! The server wraps every payload as `{success, data?, code?, err_msg?}`.
//! [`Envelope`] is the typed form of that wrapper, produced once at the
//! transport boundary so nothing deeper has to poke at untyped maps.

use crate::error::ClientError;
use serde::Deserialize;
use serde_json::{json, Value};

/// Parsed server envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `success: true`; `data` is `Value::Null` when absent
    Success { data: Value },

    /// `success: false` (or missing); `raw` is the whole response body
    Failure {
        code: Option<String>,
        err_msg: Option<String>,
        raw: Value,
    },
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    err_msg: Option<String>,
}

impl Envelope {
    /// Parse a response body into an envelope, rejecting anything that is not one
    pub fn from_value(value: Value) -> Result<Self, ClientError> {
        if !value.is_object() {
            return Err(ClientError::Decode {
                message: "response is not a JSON object".to_string(),
                preview: preview(&value),
            });
        }

        let raw: RawEnvelope =
            serde_json::from_value(value.clone()).map_err(|e| ClientError::Decode {
                message: format!("malformed response envelope: {}", e),
                preview: preview(&value),
            })?;

        if raw.success {
            Ok(Envelope::Success { data: raw.data })
        } else {
            Ok(Envelope::Failure {
                code: raw.code,
                err_msg: raw.err_msg,
                raw: value,
            })
        }
    }

    /// Build a success envelope around `data`
    pub fn success(data: Value) -> Self {
        Envelope::Success { data }
    }

    /// Build a failure envelope with an optional code and message
    pub fn failure(code: Option<&str>, err_msg: Option<&str>) -> Self {
        let mut raw = json!({ "success": false });
        if let Some(code) = code {
            raw["code"] = json!(code);
        }
        if let Some(msg) = err_msg {
            raw["err_msg"] = json!(msg);
        }
        Envelope::Failure {
            code: code.map(str::to_owned),
            err_msg: err_msg.map(str::to_owned),
            raw,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    /// Server error code of a failure envelope
    pub fn code(&self) -> Option<&str> {
        match self {
            Envelope::Failure { code, .. } => code.as_deref(),
            Envelope::Success { .. } => None,
        }
    }

    /// Non-null payload of a success envelope
    pub fn data(&self) -> Option<&Value> {
        match self {
            Envelope::Success { data } if !data.is_null() => Some(data),
            _ => None,
        }
    }

    /// Take the non-null payload of a success envelope
    pub fn into_data(self) -> Option<Value> {
        match self {
            Envelope::Success { data } if !data.is_null() => Some(data),
            _ => None,
        }
    }

    /// Reassemble the wire form, for attaching to errors
    pub fn to_value(&self) -> Value {
        match self {
            Envelope::Success { data } => json!({ "success": true, "data": data }),
            Envelope::Failure { raw, .. } => raw.clone(),
        }
    }
}

fn preview(value: &Value) -> String {
    value.to_string().chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let envelope =
            Envelope::from_value(json!({"success": true, "data": {"conv_id": "c1"}})).unwrap();
        assert!(envelope.is_success());
        assert_eq!(envelope.data(), Some(&json!({"conv_id": "c1"})));
    }

    #[test]
    fn test_success_without_data() {
        let envelope = Envelope::from_value(json!({"success": true})).unwrap();
        assert!(envelope.is_success());
        assert_eq!(envelope.data(), None);
    }

    #[test]
    fn test_failure_keeps_raw_body() {
        let body = json!({"success": false, "code": "E0103", "err_msg": "not found"});
        let envelope = Envelope::from_value(body.clone()).unwrap();
        assert_eq!(envelope.code(), Some("E0103"));
        assert_eq!(envelope.to_value(), body);
    }

    #[test]
    fn test_empty_object_is_failure() {
        let envelope = Envelope::from_value(json!({})).unwrap();
        assert!(!envelope.is_success());
        assert_eq!(envelope.code(), None);
    }

    #[test]
    fn test_rejects_non_object() {
        let err = Envelope::from_value(json!(["a", "b"])).unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[test]
    fn test_rejects_non_boolean_success() {
        let err = Envelope::from_value(json!({"success": "yes"})).unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[test]
    fn test_failure_constructor_matches_wire_shape() {
        let envelope = Envelope::failure(Some("E0103"), None);
        assert_eq!(envelope.to_value(), json!({"success": false, "code": "E0103"}));
    }
}
