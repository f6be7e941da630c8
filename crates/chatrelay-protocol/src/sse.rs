use bytes::Bytes;
use serde::Serialize;

/// Literal payload of the frame that terminates every successful stream.
pub const SSE_DONE: &str = "[DONE]";

pub const SSE_CONTENT_TYPE: &str = "text/event-stream";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

impl SseEvent {
    pub fn is_done(&self) -> bool {
        self.data == SSE_DONE
    }
}

/// Encodes one frame: `["event: " name "\n"] "data: " payload "\n\n"`.
pub fn encode_frame(event: Option<&str>, data: &[u8]) -> Bytes {
    let mut frame = Vec::with_capacity(data.len() + 32);
    if let Some(name) = event.filter(|name| !name.is_empty()) {
        frame.extend_from_slice(b"event: ");
        frame.extend_from_slice(name.as_bytes());
        frame.push(b'\n');
    }
    frame.extend_from_slice(b"data: ");
    frame.extend_from_slice(data);
    frame.extend_from_slice(b"\n\n");
    Bytes::from(frame)
}

pub fn encode_json_frame<T: Serialize>(
    event: Option<&str>,
    value: &T,
) -> Result<Bytes, serde_json::Error> {
    let payload = serde_json::to_vec(value)?;
    Ok(encode_frame(event, &payload))
}

pub fn done_frame() -> Bytes {
    encode_frame(None, SSE_DONE.as_bytes())
}

/// Incremental decoder for a `text/event-stream` body.
///
/// Frames may arrive split across arbitrary chunk boundaries, including
/// inside a multi-byte code point; bytes are buffered until a full line is
/// available, and a frame is emitted once its blank-line terminator has
/// been seen.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(end) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line);
            self.line(line.trim_end_matches(['\n', '\r']), &mut out);
        }
        out
    }

    pub fn finish(mut self) -> Vec<SseEvent> {
        let mut out = Vec::new();
        let rest = std::mem::take(&mut self.pending);
        if !rest.is_empty() {
            let rest = String::from_utf8_lossy(&rest);
            self.line(rest.trim_end_matches('\r'), &mut out);
        }
        self.dispatch(&mut out);
        out
    }

    fn line(&mut self, line: &str, out: &mut Vec<SseEvent>) {
        if line.is_empty() {
            self.dispatch(out);
            return;
        }
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()).filter(|v| !v.is_empty()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
    }

    fn dispatch(&mut self, out: &mut Vec<SseEvent>) {
        if self.event.is_none() && self.data.is_empty() {
            return;
        }
        out.push(SseEvent {
            event: self.event.take(),
            data: self.data.join("\n"),
        });
        self.data.clear();
    }
}

/// Decodes a complete body in one go.
pub fn decode_all(body: &[u8]) -> Vec<SseEvent> {
    let mut decoder = SseDecoder::new();
    let mut events = decoder.push(body);
    events.extend(decoder.finish());
    events
}
