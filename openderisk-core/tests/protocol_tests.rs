//! Property tests for request serialization and envelope parsing

use openderisk_core::protocol::{ChatRequest, Envelope, Message};
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_request() -> impl Strategy<Value = ChatRequest> {
    (
        "[a-zA-Z0-9 ?!]{1,40}",
        proptest::option::of("[a-z0-9-]{1,12}"),
        proptest::option::of("[a-z_]{1,12}"),
        proptest::option::of(-10.0f32..10.0),
        proptest::option::of(any::<u32>()),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(text, conv_uid, app_code, temperature, max_tokens, incremental, as_messages)| {
                let mut request = if as_messages {
                    ChatRequest::messages(vec![Message::user(text)])
                } else {
                    ChatRequest::text(text)
                };
                if let Some(conv_uid) = conv_uid {
                    request = request.with_conv_uid(conv_uid);
                }
                if let Some(app_code) = app_code {
                    request = request.with_app_code(app_code);
                }
                if let Some(temperature) = temperature {
                    request = request.with_temperature(temperature);
                }
                if let Some(max_tokens) = max_tokens {
                    request = request.with_max_new_tokens(max_tokens);
                }
                request.with_incremental(incremental)
            },
        )
}

proptest! {
    #[test]
    fn submit_payload_always_carries_async_work_mode(request in arb_request()) {
        let body = serde_json::to_value(&request).unwrap();
        prop_assert_eq!(&body["work_mode"], &json!("async"));
        prop_assert_eq!(&body["user_name"], &json!("cli_user"));
        prop_assert_eq!(&body["ext_info"], &json!({}));
        prop_assert!(body["incremental"].is_boolean());
        prop_assert!(body.get("user_input").is_some());
    }

    #[test]
    fn unset_options_are_omitted(text in "[a-z]{1,20}") {
        let body = serde_json::to_value(ChatRequest::text(text)).unwrap();
        for field in ["conv_uid", "app_code", "model_name", "temperature", "max_new_tokens", "messages"] {
            prop_assert!(body.get(field).is_none(), "{} should be omitted", field);
        }
    }

    #[test]
    fn envelope_success_flag_decides_variant(success in any::<bool>(), code in "[A-Z][0-9]{4}") {
        let envelope = Envelope::from_value(json!({
            "success": success,
            "code": code,
            "data": {"k": 1}
        }))
        .unwrap();
        prop_assert_eq!(envelope.is_success(), success);
        if !success {
            prop_assert_eq!(envelope.code(), Some(code.as_str()));
        }
    }

    #[test]
    fn non_object_bodies_are_rejected(n in any::<i64>(), s in ".*") {
        prop_assert!(Envelope::from_value(json!(n)).is_err());
        prop_assert!(Envelope::from_value(Value::String(s)).is_err());
    }
}
