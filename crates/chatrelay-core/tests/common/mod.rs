#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use chatrelay_core::sink::DEFAULT_BODY_CAPACITY;
use chatrelay_core::{RequestContext, RequestHints, ResponseHead, ResponseReceiver, ResponseSink, TokenEstimator};
use chatrelay_protocol::openai::create_chat_completions::request::CreateChatCompletionRequest;
use chatrelay_protocol::openai::create_chat_completions::types::{
    ChatCompletionRequestMessage, ChatCompletionRole,
};
use chatrelay_protocol::sse::decode_all;
use serde_json::Value;

pub const MODEL: &str = "coze";

pub fn context(stream: bool) -> (RequestContext, ResponseReceiver) {
    let messages = vec![
        ChatCompletionRequestMessage::new(ChatCompletionRole::System, "S"),
        ChatCompletionRequestMessage::new(ChatCompletionRole::User, "U"),
    ];
    let mut completion = CreateChatCompletionRequest::new(MODEL, messages);
    completion.stream = stream;
    let (sink, rx) = ResponseSink::channel(DEFAULT_BODY_CAPACITY);
    let estimator: Arc<dyn TokenEstimator> = Arc::new(|text: &str| text.chars().count() as i64);
    let ctx = RequestContext::new("trace-test", completion, RequestHints::default(), estimator, sink);
    (ctx, rx)
}

pub fn json_body(chunks: &[Bytes]) -> Value {
    let body: Vec<u8> = chunks.iter().flat_map(|chunk| chunk.iter().copied()).collect();
    serde_json::from_slice(&body).expect("json body")
}

/// Every `data:` payload in order; `[DONE]` is kept as the JSON string "[DONE]".
pub fn sse_payloads(head: &ResponseHead, chunks: &[Bytes]) -> Vec<Value> {
    assert_eq!(head.headers["content-type"], "text/event-stream");
    let body: Vec<u8> = chunks.iter().flat_map(|chunk| chunk.iter().copied()).collect();
    decode_all(&body)
        .into_iter()
        .map(|event| {
            if event.is_done() {
                Value::String(event.data)
            } else {
                serde_json::from_str(&event.data).expect("json frame")
            }
        })
        .collect()
}

pub fn delta_content(frame: &Value) -> Option<&str> {
    frame["choices"][0]["delta"]["content"].as_str()
}
