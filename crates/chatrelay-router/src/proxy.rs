use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use futures_util::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use chatrelay_common::GlobalConfig;
use chatrelay_core::sink::DEFAULT_BODY_CAPACITY;
use chatrelay_core::{
    MatcherChain, ReplaceMatcher, RequestContext, RequestHints, ResponseReceiver, ResponseSink,
    StopSequenceMatcher, TokenEstimator, response, validate_messages,
};
use chatrelay_protocol::openai::create_chat_completions::request::CreateChatCompletionRequest;
use chatrelay_protocol::openai::error::ErrorEnvelope;
use chatrelay_provider::{BackendRegistry, BackendTarget};

/// `true` collapses a claude-style 3-turn exchange into its first turn.
pub const SPECIALIZED_HEADER: &str = "x-relay-specialized";
/// `true` answers with the adapted prompt instead of calling the backend.
pub const ECHO_HEADER: &str = "x-relay-echo";

#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<GlobalConfig>,
    pub backends: BackendRegistry,
    pub estimator: Arc<dyn TokenEstimator>,
}

#[derive(Clone)]
struct RequestTraceId(String);

pub fn relay_router(state: RelayState) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/chat/completions", post(chat_completions))
        .layer(middleware::from_fn(trace_request))
        .with_state(state)
}

async fn trace_request(mut req: Request<Body>, next: Next) -> Response {
    let trace_id = uuid::Uuid::now_v7().to_string();
    info!(
        event = "downstream_received",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path()
    );
    req.extensions_mut().insert(RequestTraceId(trace_id.clone()));
    let resp = next.run(req).await;
    info!(
        event = "downstream_head",
        trace_id = %trace_id,
        status = resp.status().as_u16()
    );
    resp
}

fn header_flag(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

pub fn request_hints(headers: &HeaderMap, config: &GlobalConfig) -> RequestHints {
    RequestHints {
        specialized: header_flag(headers, SPECIALIZED_HEADER),
        echo: config.echo || header_flag(headers, ECHO_HEADER),
    }
}

/// Redaction rules first, then the request's own stop sequences.
pub fn build_matchers(config: &GlobalConfig, completion: &CreateChatCompletionRequest) -> MatcherChain {
    let mut chain = MatcherChain::new();
    for rule in &config.redact {
        chain.push(ReplaceMatcher::new(rule.pattern.clone(), rule.replacement.clone()));
    }
    let stops = completion.stop_sequences();
    if !stops.is_empty() {
        chain.push(StopSequenceMatcher::new(stops));
    }
    chain
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorEnvelope::new(message))).into_response()
}

async fn chat_completions(
    State(state): State<RelayState>,
    Extension(trace_id): Extension<RequestTraceId>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let completion: CreateChatCompletionRequest = match serde_json::from_slice(&body) {
        Ok(completion) => completion,
        Err(err) => {
            warn!(event = "invalid_body", trace_id = %trace_id.0, error = %err);
            return error_response(StatusCode::BAD_REQUEST, format!("invalid request body: {err}"));
        }
    };
    if let Err(err) = validate_messages(&completion) {
        warn!(event = "invalid_messages", trace_id = %trace_id.0, error = %err);
        return error_response(StatusCode::BAD_REQUEST, err.to_string());
    }
    let target = match BackendTarget::resolve(&completion.model) {
        Ok(target) => target,
        Err(err) => return error_response(err.status(), err.to_string()),
    };

    let hints = request_hints(&headers, &state.config);
    let mut matchers = build_matchers(&state.config, &completion);
    let (sink, receiver) = ResponseSink::channel(DEFAULT_BODY_CAPACITY);
    let mut ctx = RequestContext::new(
        trace_id.0,
        completion,
        hints,
        state.estimator.clone(),
        sink,
    );
    let backend = state.backends.get(target.kind);
    info!(
        event = "relay_start",
        trace_id = %ctx.trace_id,
        backend = target.kind.as_str(),
        model = %ctx.model(),
        stream = ctx.is_stream(),
        echo = hints.echo,
        specialized = hints.specialized
    );

    tokio::spawn(async move {
        let outcome = backend
            .completion(&mut ctx, &mut matchers, &target.model)
            .await;
        match outcome {
            Err(err) if !ctx.sink.responded() => {
                response::error(&mut ctx, Some(err.status()), &err).await;
            }
            Err(err) => {
                warn!(event = "relay_failed_after_response", trace_id = %ctx.trace_id, error = %err);
            }
            Ok(()) if !ctx.sink.responded() && !ctx.sink.is_closed() => {
                response::error(
                    &mut ctx,
                    Some(StatusCode::BAD_GATEWAY),
                    "backend produced no content",
                )
                .await;
            }
            Ok(()) => {}
        }
    });

    relay_response(receiver).await
}

/// Waits for the committed head, then streams the body frame by frame.
async fn relay_response(receiver: ResponseReceiver) -> Response {
    let ResponseReceiver { head, body } = receiver;
    let Ok(head) = head.await else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "relay task ended without a response",
        );
    };
    let stream = ReceiverStream::new(body).map(Ok::<_, Infallible>);
    let mut resp = Response::new(Body::from_stream(stream));
    *resp.status_mut() = head.status;
    *resp.headers_mut() = head.headers;
    resp
}
