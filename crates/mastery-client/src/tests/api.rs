use crate::Error;
use crate::api::{ChatMessage, ChatRequest, ChatResponse, TutorClient, first_text};
use crate::retry::Retryable;

#[test]
fn rate_limit_and_server_errors_are_retryable() {
    for status in [429, 500, 502, 503, 599] {
        let err = Error::Api {
            status,
            message: String::new(),
        };
        assert!(err.is_retryable(), "status {status} should be retryable");
    }
}

#[test]
fn client_errors_are_terminal() {
    for status in [400, 401, 403, 404, 422] {
        let err = Error::Api {
            status,
            message: String::new(),
        };
        assert!(!err.is_retryable(), "status {status} should be terminal");
    }
    assert!(!Error::EmptyResponse.is_retryable());
}

#[test]
fn response_parsing_takes_the_first_text_block() {
    let response: ChatResponse = serde_json::from_str(
        r#"{"content":[{"type":"tool_use","id":"t1","name":"n","input":{}},{"type":"text","text":"hello"}]}"#,
    )
    .unwrap();
    assert_eq!(first_text(response).unwrap(), "hello");
}

#[test]
fn a_reply_without_text_blocks_is_empty() {
    let response: ChatResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
    assert!(matches!(first_text(response), Err(Error::EmptyResponse)));
}

#[test]
fn request_serialization_omits_missing_system_prompt() {
    let messages = vec![ChatMessage::user("hi")];
    let request = ChatRequest {
        model: "tutor-mini",
        max_tokens: 16,
        system: None,
        messages: &messages,
    };
    let value = serde_json::to_value(&request).unwrap();
    assert!(value.get("system").is_none());
    assert_eq!(value["model"], "tutor-mini");
    assert_eq!(value["messages"][0]["role"], "user");
    assert_eq!(value["messages"][0]["content"], "hi");
}

#[test]
fn client_settings_come_from_the_engine_config() {
    let mut config = mastery_core::MasteryConfig::default_engine();
    config.set_value("model", serde_json::json!("tutor-mini"));
    config.set_value("api.base_url", serde_json::json!("https://api.example.test/"));
    let client = TutorClient::new("key", &config);
    assert_eq!(client.model(), "tutor-mini");
}
