use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::openai::create_chat_completions::types::ChatCompletionRequestMessage;

/// Up to 4 stop sequences are allowed, but this limit is not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopConfiguration {
    Single(String),
    Many(Vec<String>),
}

impl StopConfiguration {
    pub fn sequences(&self) -> Vec<String> {
        let all = match self {
            StopConfiguration::Single(value) => vec![value.clone()],
            StopConfiguration::Many(values) => values.clone(),
        };
        all.into_iter().filter(|value| !value.is_empty()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateChatCompletionRequest {
    /// Must contain at least 1 message; checked by the relay's validator, not here.
    #[serde(default)]
    pub messages: Vec<ChatCompletionRequestMessage>,
    pub model: String,
    #[serde(default)]
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<JsonValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
}

impl CreateChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatCompletionRequestMessage>) -> Self {
        Self {
            messages,
            model: model.into(),
            stream: false,
            stop: None,
            tools: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn stop_sequences(&self) -> Vec<String> {
        self.stop
            .as_ref()
            .map(StopConfiguration::sequences)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_defaults_to_false() {
        let req: CreateChatCompletionRequest = serde_json::from_value(serde_json::json!({
            "model": "coze",
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .expect("parse request");
        assert!(!req.stream);
        assert!(req.stop_sequences().is_empty());
    }

    #[test]
    fn stop_accepts_string_or_list() {
        let single: CreateChatCompletionRequest = serde_json::from_value(serde_json::json!({
            "model": "m", "messages": [], "stop": "\n\nHuman:"
        }))
        .expect("parse single stop");
        assert_eq!(single.stop_sequences(), vec!["\n\nHuman:".to_string()]);

        let many: CreateChatCompletionRequest = serde_json::from_value(serde_json::json!({
            "model": "m", "messages": [], "stop": ["a", "", "b"]
        }))
        .expect("parse stop list");
        assert_eq!(many.stop_sequences(), vec!["a".to_string(), "b".to_string()]);
    }
}
