use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use chatrelay_common::{GlobalConfig, GlobalConfigPatch, RedactRule};
use chatrelay_core::{Fragment, FragmentReceiver, RelayResult, TokenEstimator, fragment_channel};
use chatrelay_protocol::sse::decode_all;
use chatrelay_provider::{BackendRegistry, CozeConnector, CozeMessage};
use chatrelay_router::{ECHO_HEADER, RelayState, relay_router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

struct Replay(Vec<&'static str>);

#[async_trait]
impl CozeConnector for Replay {
    async fn chat(&self, _bot: &str, _messages: Vec<CozeMessage>) -> RelayResult<FragmentReceiver> {
        let (tx, rx) = fragment_channel(16);
        let fragments = self.0.clone();
        tokio::spawn(async move {
            for raw in fragments {
                if tx.send(Fragment::parse(raw)).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}

fn config(echo: bool, redact: Vec<RedactRule>) -> GlobalConfig {
    GlobalConfigPatch {
        echo: Some(echo),
        redact: Some(redact),
        ..Default::default()
    }
    .into_config()
    .unwrap()
}

fn app(config: GlobalConfig, coze: Option<Vec<&'static str>>) -> Router {
    let coze = coze.map(|fragments| Arc::new(Replay(fragments)) as Arc<dyn CozeConnector>);
    let estimator: Arc<dyn TokenEstimator> = Arc::new(|text: &str| text.split_whitespace().count() as i64);
    relay_router(RelayState {
        config: Arc::new(config),
        backends: BackendRegistry::new(coze, None),
        estimator,
    })
}

fn post(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(resp: Response) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn json_body(resp: Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

fn hello(model: &str, stream: bool) -> Value {
    json!({
        "model": model,
        "stream": stream,
        "messages": [
            {"role": "system", "content": "S"},
            {"role": "user", "content": "U"}
        ]
    })
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = app(config(false, vec![]), None);
    let req = Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert!(body["error"]["message"].as_str().unwrap().starts_with("invalid request body"));
}

#[tokio::test]
async fn validation_messages() {
    let app = app(config(false, vec![]), None);
    let resp = app
        .clone()
        .oneshot(post("/v1/chat/completions", json!({"model": "coze", "messages": []})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["message"], "[] is too short - 'messages'");

    let resp = app
        .oneshot(post(
            "/chat/completions",
            json!({"model": "coze", "messages": [{"role": "user", "content": "a"}, {"role": "robot", "content": "b"}]}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(resp).await["error"]["message"],
        "'robot' is not in ['system', 'assistant', 'user', 'tool', 'function'] - 'messages.[1].role'"
    );
}

#[tokio::test]
async fn unknown_model_is_404() {
    let app = app(config(false, vec![]), None);
    let resp = app.oneshot(post("/v1/chat/completions", hello("gpt-4o", false))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_connector_is_503() {
    let app = app(config(false, vec![]), None);
    let resp = app.oneshot(post("/v1/chat/completions", hello("coze", false))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(resp).await["error"]["message"], "coze backend is not configured");
}

#[tokio::test]
async fn echo_header_returns_prompt() {
    let app = app(config(false, vec![]), None);
    let mut req = post("/v1/chat/completions", hello("lmsys/llama-3", false));
    req.headers_mut().insert(ECHO_HEADER, "true".parse().unwrap());
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(
        body["choices"][0]["message"]["content"],
        "<|system|>\nS<|end|>\n\n<|user|>\nU"
    );
    assert_eq!(body["model"], "lmsys/llama-3");
}

#[tokio::test]
async fn non_stream_relay() {
    let app = app(config(false, vec![]), Some(vec!["text: Hel", "text: lo"]));
    let resp = app.oneshot(post("/v1/chat/completions", hello("coze", false))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/json");
    let body = json_body(resp).await;
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["choices"][0]["message"]["content"], "Hello");
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
}

#[tokio::test]
async fn stream_relay_applies_redaction_and_stop() {
    let redact = vec![RedactRule {
        pattern: "secret".to_string(),
        replacement: "***".to_string(),
    }];
    let app = app(
        config(false, redact),
        Some(vec!["the sec", "ret word", " END trailing"]),
    );
    let mut request = hello("coze/bot", true);
    request["stop"] = json!("END");
    let resp = app.oneshot(post("/v1/chat/completions", request)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/event-stream");
    assert_eq!(resp.headers()["x-accel-buffering"], "no");

    let events = decode_all(&body_bytes(resp).await);
    let (done, frames) = events.split_last().unwrap();
    assert!(done.is_done());
    let frames: Vec<Value> = frames
        .iter()
        .map(|event| serde_json::from_str(&event.data).unwrap())
        .collect();
    let text: String = frames
        .iter()
        .filter_map(|frame| frame["choices"][0]["delta"]["content"].as_str())
        .collect();
    assert_eq!(text, "the *** word ");
    let terminal = frames.last().unwrap();
    assert_eq!(terminal["choices"][0]["finish_reason"], "stop");
    assert_eq!(terminal["usage"]["completion_tokens"], 3);
}

#[tokio::test]
async fn silent_backend_is_502() {
    let app = app(config(false, vec![]), Some(vec!["text: "]));
    let resp = app.oneshot(post("/v1/chat/completions", hello("coze", false))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn backend_error_before_stream_is_500_envelope() {
    let app = app(config(false, vec![]), Some(vec!["error: quota exceeded"]));
    let resp = app.oneshot(post("/v1/chat/completions", hello("coze", true))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(resp).await["error"]["message"], "quota exceeded");
}
