//! Wire rendering for every backend's output.
//!
//! All emitters mark the request as responded. Streaming emitters lazily set
//! the event-stream headers; JSON emitters commit status and body at once.

use std::fmt::Display;
use std::time::Duration;

use bytes::Bytes;
use chatrelay_protocol::openai::create_chat_completions::response::{
    ChatCompletionChoice, ChatCompletionObjectType, CreateChatCompletionResponse,
};
use chatrelay_protocol::openai::create_chat_completions::stream::{
    ChatCompletionChunkObjectType, ChatCompletionStreamChoice, CreateChatCompletionStreamResponse,
};
use chatrelay_protocol::openai::create_chat_completions::types::{
    ChatCompletionFinishReason, ChatCompletionMessageToolCall,
    ChatCompletionMessageToolCallChunk, ChatCompletionMessageToolCallChunkFunction,
    ChatCompletionMessageToolCallFunction, ChatCompletionResponseMessage,
    ChatCompletionResponseRole, ChatCompletionRole, ChatCompletionStreamResponseDelta,
    ChatCompletionToolCallType, CompletionUsage,
};
use chatrelay_protocol::openai::error::ErrorEnvelope;
use chatrelay_protocol::sse::{SSE_DONE, done_frame, encode_json_frame};
use http::StatusCode;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::context::RequestContext;
use crate::tokens::usage_for;

/// Largest chunk, in chars, that long content is split into when streamed.
pub const LONG_CONTENT_STEP: usize = 1000;

/// Pause between the terminal JSON frame and the `[DONE]` marker so the
/// former reaches the transport first.
pub const DONE_FLUSH_DELAY: Duration = Duration::from_millis(100);

pub fn now_epoch_seconds() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

fn completion_id(created: i64) -> String {
    format!("chatcmpl-{created}")
}

/// `call_` followed by 5 random alphanumerics.
pub fn tool_call_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(char::from)
        .collect();
    format!("call_{suffix}")
}

pub fn is_response_sent(ctx: &RequestContext) -> bool {
    ctx.sink.responded()
}

/// Writes `{"error":{"message":...}}`; `None` status means 500.
pub async fn error(ctx: &mut RequestContext, status: Option<StatusCode>, message: impl Display) {
    let status = status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = message.to_string();
    ctx.sink.mark_responded();
    warn!(
        event = "response_error",
        trace_id = %ctx.trace_id,
        status = %status.as_u16(),
        message = %message
    );
    match serde_json::to_vec(&ErrorEnvelope::new(message)) {
        Ok(body) => ctx.sink.write_json(status, Bytes::from(body)).await,
        Err(err) => warn!(event = "encode_failed", trace_id = %ctx.trace_id, error = %err),
    }
}

pub async fn full(ctx: &mut RequestContext, model: &str, content: &str) {
    ctx.sink.mark_responded();
    let created = now_epoch_seconds();
    let response = CreateChatCompletionResponse {
        id: completion_id(created),
        object: ChatCompletionObjectType::ChatCompletion,
        created,
        model: model.to_string(),
        choices: vec![ChatCompletionChoice {
            index: 0,
            message: ChatCompletionResponseMessage {
                role: ChatCompletionResponseRole::Assistant,
                content: Some(content.to_string()),
                tool_calls: None,
            },
            finish_reason: ChatCompletionFinishReason::Stop,
        }],
        usage: ctx.usage,
    };
    write_json_ok(ctx, &response).await;
}

/// One SSE frame; the literal `[DONE]` content runs the terminal sequence.
pub async fn stream_chunk(ctx: &mut RequestContext, model: &str, content: &str, created: i64) {
    if content == SSE_DONE {
        stream_done(ctx, model, created).await;
    } else {
        stream_text(ctx, model, content, created).await;
    }
}

/// A content delta. Empty content only sets the stream headers.
pub async fn stream_text(ctx: &mut RequestContext, model: &str, content: &str, created: i64) {
    ctx.sink.mark_responded();
    ctx.sink.set_sse_headers();
    if content.is_empty() {
        return;
    }
    let chunk = chunk_envelope(
        model,
        created,
        Some(ChatCompletionStreamResponseDelta {
            role: Some(ChatCompletionRole::Assistant),
            content: Some(content.to_string()),
            tool_calls: None,
        }),
        None,
        None,
    );
    write_event(ctx, &chunk).await;
}

/// Terminal frame with `finish_reason=stop` and usage, then `data: [DONE]`.
pub async fn stream_done(ctx: &mut RequestContext, model: &str, created: i64) {
    ctx.sink.mark_responded();
    ctx.sink.set_sse_headers();
    let chunk = chunk_envelope(
        model,
        created,
        Some(ChatCompletionStreamResponseDelta {
            role: Some(ChatCompletionRole::Assistant),
            content: None,
            tool_calls: None,
        }),
        Some(ChatCompletionFinishReason::Stop),
        ctx.usage,
    );
    write_event(ctx, &chunk).await;
    tokio::time::sleep(DONE_FLUSH_DELAY).await;
    ctx.sink.write_frame(done_frame()).await;
    ctx.sink.finish();
    info!(event = "stream_closed", trace_id = %ctx.trace_id);
}

/// Streams `content` in chunks of at most [`LONG_CONTENT_STEP`] chars, then `[DONE]`.
pub async fn long_content_as_stream(ctx: &mut RequestContext, model: &str, content: &str) {
    let created = now_epoch_seconds();
    for piece in split_chars(content, LONG_CONTENT_STEP) {
        stream_text(ctx, model, piece, created).await;
    }
    stream_done(ctx, model, created).await;
}

/// Renders dry-run output in whichever mode the caller asked for.
///
/// Usage is computed from `content` unless the caller already attached it.
pub async fn echo(ctx: &mut RequestContext, model: &str, content: &str, stream: bool) {
    if ctx.usage.is_none() {
        ctx.usage = Some(usage_for(ctx.estimator(), content, ctx.prompt_tokens));
    }
    if stream {
        long_content_as_stream(ctx, model, content).await;
    } else {
        full(ctx, model, content).await;
    }
}

pub async fn tool_call(ctx: &mut RequestContext, model: &str, name: &str, arguments: &str) {
    ctx.sink.mark_responded();
    let created = now_epoch_seconds();
    let response = CreateChatCompletionResponse {
        id: completion_id(created),
        object: ChatCompletionObjectType::ChatCompletion,
        created,
        model: model.to_string(),
        choices: vec![ChatCompletionChoice {
            index: 0,
            message: ChatCompletionResponseMessage {
                role: ChatCompletionResponseRole::Assistant,
                content: None,
                tool_calls: Some(vec![ChatCompletionMessageToolCall {
                    id: tool_call_id(),
                    r#type: ChatCompletionToolCallType::Function,
                    function: ChatCompletionMessageToolCallFunction {
                        name: name.to_string(),
                        arguments: arguments.to_string(),
                    },
                }]),
            },
            finish_reason: ChatCompletionFinishReason::ToolCalls,
        }],
        usage: ctx.usage,
    };
    write_json_ok(ctx, &response).await;
}

/// Name frame, arguments frame, finish frame, then `[DONE]`.
///
/// Only the first delta carries id/type/role; clients append the
/// arguments delta onto the call opened by it.
pub async fn tool_call_stream(
    ctx: &mut RequestContext,
    model: &str,
    name: &str,
    arguments: &str,
    created: i64,
) {
    ctx.sink.mark_responded();
    ctx.sink.set_sse_headers();

    let opening = chunk_envelope(
        model,
        created,
        Some(ChatCompletionStreamResponseDelta {
            role: Some(ChatCompletionRole::Assistant),
            content: None,
            tool_calls: Some(vec![ChatCompletionMessageToolCallChunk {
                index: 0,
                id: Some(tool_call_id()),
                r#type: Some(ChatCompletionToolCallType::Function),
                function: Some(ChatCompletionMessageToolCallChunkFunction {
                    name: Some(name.to_string()),
                    arguments: Some(String::new()),
                }),
            }]),
        }),
        None,
        None,
    );
    write_event(ctx, &opening).await;

    let args = chunk_envelope(
        model,
        created,
        Some(ChatCompletionStreamResponseDelta {
            role: None,
            content: None,
            tool_calls: Some(vec![ChatCompletionMessageToolCallChunk {
                index: 0,
                id: None,
                r#type: None,
                function: Some(ChatCompletionMessageToolCallChunkFunction {
                    name: None,
                    arguments: Some(arguments.to_string()),
                }),
            }]),
        }),
        None,
        None,
    );
    write_event(ctx, &args).await;

    let finish = chunk_envelope(
        model,
        created,
        None,
        Some(ChatCompletionFinishReason::ToolCalls),
        ctx.usage,
    );
    write_event(ctx, &finish).await;

    // No flush delay here, unlike `stream_done`.
    ctx.sink.write_frame(done_frame()).await;
    ctx.sink.finish();
}

fn chunk_envelope(
    model: &str,
    created: i64,
    delta: Option<ChatCompletionStreamResponseDelta>,
    finish_reason: Option<ChatCompletionFinishReason>,
    usage: Option<CompletionUsage>,
) -> CreateChatCompletionStreamResponse {
    CreateChatCompletionStreamResponse {
        id: completion_id(created),
        object: ChatCompletionChunkObjectType::ChatCompletionChunk,
        created,
        model: model.to_string(),
        choices: vec![ChatCompletionStreamChoice {
            index: 0,
            delta,
            finish_reason,
        }],
        usage: finish_reason.and(usage),
    }
}

async fn write_event<T: Serialize>(ctx: &mut RequestContext, value: &T) {
    match encode_json_frame(None, value) {
        Ok(frame) => ctx.sink.write_frame(frame).await,
        Err(err) => warn!(event = "encode_failed", trace_id = %ctx.trace_id, error = %err),
    }
}

async fn write_json_ok<T: Serialize>(ctx: &mut RequestContext, value: &T) {
    match serde_json::to_vec(value) {
        Ok(body) => ctx.sink.write_json(StatusCode::OK, Bytes::from(body)).await,
        Err(err) => warn!(event = "encode_failed", trace_id = %ctx.trace_id, error = %err),
    }
}

/// Splits on char boundaries so no multi-byte code point is cut.
pub fn split_chars(content: &str, step: usize) -> Vec<&str> {
    let step = step.max(1);
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in content.char_indices() {
        if count == step {
            pieces.push(&content[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < content.len() {
        pieces.push(&content[start..]);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_respects_char_boundaries() {
        let content = "añ€😀".repeat(3);
        let pieces = split_chars(&content, 5);
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(|piece| piece.chars().count() <= 5));
        assert_eq!(pieces.concat(), content);
    }

    #[test]
    fn split_empty_and_exact() {
        assert!(split_chars("", 3).is_empty());
        assert_eq!(split_chars("abcdef", 3), vec!["abc", "def"]);
    }

    #[test]
    fn tool_call_id_shape() {
        let id = tool_call_id();
        assert!(id.starts_with("call_"));
        assert_eq!(id.len(), 10);
        assert!(id[5..].chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
