use std::sync::Arc;

use chatrelay_protocol::openai::create_chat_completions::request::CreateChatCompletionRequest;
use chatrelay_protocol::openai::create_chat_completions::types::CompletionUsage;

use crate::sink::ResponseSink;
use crate::tokens::TokenEstimator;

/// Per-request switches derived from headers and global config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestHints {
    /// Collapse a 3-message claude-style exchange into its first message.
    pub specialized: bool,
    /// Render the adapted prompt back to the caller instead of calling a backend.
    pub echo: bool,
}

/// Everything one request's lifecycle reads and mutates.
///
/// Owned by exactly one task from request receipt to the last emitted byte.
pub struct RequestContext {
    pub trace_id: String,
    pub completion: CreateChatCompletionRequest,
    pub hints: RequestHints,
    /// Sum of token estimates over the adapted backend payload.
    pub prompt_tokens: i64,
    /// Attached to terminal frames and full responses once computed.
    pub usage: Option<CompletionUsage>,
    pub sink: ResponseSink,
    estimator: Arc<dyn TokenEstimator>,
}

impl RequestContext {
    pub fn new(
        trace_id: impl Into<String>,
        completion: CreateChatCompletionRequest,
        hints: RequestHints,
        estimator: Arc<dyn TokenEstimator>,
        sink: ResponseSink,
    ) -> Self {
        Self {
            trace_id: trace_id.into(),
            completion,
            hints,
            prompt_tokens: 0,
            usage: None,
            sink,
            estimator,
        }
    }

    pub fn model(&self) -> &str {
        &self.completion.model
    }

    pub fn is_stream(&self) -> bool {
        self.completion.stream
    }

    pub fn estimator(&self) -> &dyn TokenEstimator {
        self.estimator.as_ref()
    }

    pub fn count_tokens(&self, text: &str) -> i64 {
        self.estimator.count(text)
    }
}
