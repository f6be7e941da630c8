use chatrelay_core::{RelayResult, RequestContext, response};
use tracing::info;

use crate::toolcall::append_tool_section;

/// Answers with the adapted prompt instead of calling the backend.
pub async fn echo_prompt(ctx: &mut RequestContext, mut content: String) -> RelayResult<()> {
    append_tool_section(&mut content, &ctx.completion.messages)?;
    let model = ctx.model().to_string();
    let stream = ctx.is_stream();
    info!(
        event = "echo",
        trace_id = %ctx.trace_id,
        stream,
        chars = content.chars().count()
    );
    response::echo(ctx, &model, &content, stream).await;
    Ok(())
}
