use tracing::{debug, info, warn};

use crate::context::RequestContext;
use crate::error::{RelayError, RelayResult};
use crate::fragment::{Fragment, FragmentReceiver};
use crate::matcher::MatcherChain;
use crate::response;
use crate::tokens::usage_for;

/// Drains a backend's fragments through `matchers` and renders them.
///
/// Streaming requests get each surviving fragment as its own chunk and a
/// usage-bearing terminal sequence; non-streaming requests get one envelope
/// once the channel closes. Returns the forwarded content, which is partial
/// when the backend reported an error.
pub async fn wait_response(
    ctx: &mut RequestContext,
    matchers: &mut MatcherChain,
    mut rx: FragmentReceiver,
) -> String {
    let model = ctx.model().to_string();
    let stream = ctx.is_stream();
    let created = response::now_epoch_seconds();
    let mut content = String::new();
    info!(event = "consume_started", trace_id = %ctx.trace_id, stream);

    loop {
        let fragment = tokio::select! {
            biased;
            _ = ctx.sink.closed() => {
                info!(
                    event = "client_gone",
                    trace_id = %ctx.trace_id,
                    forwarded = content.len()
                );
                return content;
            }
            fragment = rx.recv() => fragment,
        };

        let raw = match fragment {
            None => {
                let tail = matchers.flush().text;
                if !tail.is_empty() {
                    if stream {
                        response::stream_text(ctx, &model, &tail, created).await;
                    }
                    content.push_str(&tail);
                }
                break;
            }
            Some(Fragment::Error(message)) => {
                warn!(event = "backend_error", trace_id = %ctx.trace_id, error = %message);
                if !ctx.sink.is_sse() {
                    response::error(ctx, None, &message).await;
                    return content;
                }
                // A started chunk stream cannot carry an error object.
                break;
            }
            Some(Fragment::Text(raw)) => raw,
        };
        if raw.is_empty() {
            continue;
        }
        debug!(event = "raw_fragment", trace_id = %ctx.trace_id, raw = %raw);

        let out = matchers.apply(&raw);
        if !out.text.is_empty() {
            if stream {
                response::stream_text(ctx, &model, &out.text, created).await;
            }
            content.push_str(&out.text);
        }
        if out.stop {
            debug!(event = "stream_truncated", trace_id = %ctx.trace_id);
            break;
        }
    }

    if content.is_empty() && !ctx.sink.responded() {
        info!(event = "consume_empty", trace_id = %ctx.trace_id);
        return content;
    }

    ctx.usage = Some(usage_for(ctx.estimator(), &content, ctx.prompt_tokens));
    if stream {
        response::stream_done(ctx, &model, created).await;
    } else {
        response::full(ctx, &model, &content).await;
    }
    info!(
        event = "consume_finished",
        trace_id = %ctx.trace_id,
        completion_tokens = ctx.usage.map(|usage| usage.completion_tokens).unwrap_or_default()
    );
    content
}

/// Concatenates every text fragment until the channel closes.
///
/// `cancel` sees the accumulated text after each non-empty fragment; once it
/// returns true the rest of the channel is left unread.
pub async fn wait_message(
    mut rx: FragmentReceiver,
    cancel: Option<&(dyn Fn(&str) -> bool + Send + Sync)>,
) -> RelayResult<String> {
    let mut content = String::new();
    while let Some(fragment) = rx.recv().await {
        let text = match fragment {
            Fragment::Error(message) => return Err(RelayError::Backend(message)),
            Fragment::Text(text) => text,
        };
        if text.is_empty() {
            continue;
        }
        debug!(event = "raw_fragment", raw = %text);
        content.push_str(&text);
        if cancel.is_some_and(|cancel| cancel(&content)) {
            break;
        }
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::fragment_channel;

    #[tokio::test]
    async fn wait_message_joins_fragments() {
        let (tx, rx) = fragment_channel(8);
        for raw in ["text: Hel", "", "lo"] {
            tx.send(Fragment::parse(raw)).await.unwrap();
        }
        drop(tx);
        assert_eq!(wait_message(rx, None).await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn wait_message_error_wins() {
        let (tx, rx) = fragment_channel(8);
        tx.send(Fragment::text("partial")).await.unwrap();
        tx.send(Fragment::parse("error: boom")).await.unwrap();
        drop(tx);
        assert_eq!(
            wait_message(rx, None).await,
            Err(RelayError::Backend("boom".to_string()))
        );
    }

    #[tokio::test]
    async fn wait_message_stops_when_cancelled() {
        let (tx, rx) = fragment_channel(8);
        for raw in ["one ", "two ", "three"] {
            tx.send(Fragment::text(raw)).await.unwrap();
        }
        let cancel = |text: &str| text.contains("two");
        let content = wait_message(rx, Some(&cancel)).await.unwrap();
        assert_eq!(content, "one two ");
        drop(tx);
    }
}
