use bytes::Bytes;
use chatrelay_protocol::sse::SSE_CONTENT_TYPE;
use http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue, StatusCode};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub const DEFAULT_BODY_CAPACITY: usize = 64;

/// Status line and headers, committed once before the first body byte.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Reading half handed to the HTTP layer (or to tests).
#[derive(Debug)]
pub struct ResponseReceiver {
    pub head: oneshot::Receiver<ResponseHead>,
    pub body: mpsc::Receiver<Bytes>,
}

impl ResponseReceiver {
    /// Waits for the head, then drains the body until the sink finishes.
    /// Returns `None` if the sink was dropped without responding.
    pub async fn collect(self) -> Option<(ResponseHead, Vec<Bytes>)> {
        let ResponseReceiver { head, mut body } = self;
        let head = head.await.ok()?;
        let mut chunks = Vec::new();
        while let Some(chunk) = body.recv().await {
            chunks.push(chunk);
        }
        Some((head, chunks))
    }
}

/// Request-scoped writer standing between the emitter and the transport.
///
/// Headers stay mutable until the first body write commits them. Each
/// frame is one channel item, so the transport flushes frame by frame.
#[derive(Debug)]
pub struct ResponseSink {
    headers: HeaderMap,
    head_tx: Option<oneshot::Sender<ResponseHead>>,
    body_tx: Option<mpsc::Sender<Bytes>>,
    responded: bool,
    closed: bool,
}

impl ResponseSink {
    pub fn channel(capacity: usize) -> (Self, ResponseReceiver) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                headers: HeaderMap::new(),
                head_tx: Some(head_tx),
                body_tx: Some(body_tx),
                responded: false,
                closed: false,
            },
            ResponseReceiver {
                head: head_rx,
                body: body_rx,
            },
        )
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Sets the event-stream headers unless a content type is already present.
    pub fn set_sse_headers(&mut self) {
        if self.headers.contains_key(CONTENT_TYPE) {
            return;
        }
        let h = &mut self.headers;
        h.insert(CONTENT_TYPE, HeaderValue::from_static(SSE_CONTENT_TYPE));
        h.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        h.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        h.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        h.insert("x-accel-buffering", HeaderValue::from_static("no"));
    }

    pub fn is_sse(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains(SSE_CONTENT_TYPE))
    }

    pub fn mark_responded(&mut self) {
        self.responded = true;
    }

    pub fn responded(&self) -> bool {
        self.responded || self.is_sse()
    }

    pub fn head_committed(&self) -> bool {
        self.head_tx.is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Resolves once the client side is gone or a write has failed.
    pub async fn closed(&self) {
        if self.closed {
            return;
        }
        match &self.body_tx {
            Some(tx) => tx.closed().await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Writes a complete JSON response and ends the body.
    pub async fn write_json(&mut self, status: StatusCode, body: Bytes) {
        let Some(head_tx) = self.head_tx.take() else {
            warn!(
                event = "response_head_committed",
                status = %status.as_u16(),
                "dropping json body written after the response head"
            );
            return;
        };
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if head_tx.send(ResponseHead { status, headers }).is_err() {
            self.fail("client dropped before response head");
            return;
        }
        self.send(body).await;
        self.finish();
    }

    /// Writes one frame, committing a `200` head with the current headers first.
    pub async fn write_frame(&mut self, frame: Bytes) {
        if let Some(head_tx) = self.head_tx.take() {
            let head = ResponseHead {
                status: StatusCode::OK,
                headers: self.headers.clone(),
            };
            if head_tx.send(head).is_err() {
                self.fail("client dropped before response head");
                return;
            }
        }
        self.send(frame).await;
    }

    /// Ends the body stream; later writes are ignored.
    pub fn finish(&mut self) {
        self.body_tx = None;
    }

    async fn send(&mut self, chunk: Bytes) {
        if self.closed {
            debug!(event = "write_after_close", bytes = chunk.len());
            return;
        }
        let Some(tx) = &self.body_tx else {
            debug!(event = "write_after_finish", bytes = chunk.len());
            return;
        };
        if tx.send(chunk).await.is_err() {
            self.fail("client disconnected");
        }
    }

    fn fail(&mut self, reason: &str) {
        warn!(event = "transport_error", reason = %reason);
        self.closed = true;
        self.body_tx = None;
    }
}
