use chatrelay_core::{RelayError, RelayResult};
use chatrelay_protocol::openai::create_chat_completions::types::{
    ChatCompletionRequestMessage, ChatCompletionRole,
};

pub const TOOL_SECTION_HEADER: &str = "\n----------toolCallMessages----------\n";

/// Tool results, function results and assistant turns that issued tool calls.
pub fn extract_tool_messages(
    messages: &[ChatCompletionRequestMessage],
) -> Vec<&ChatCompletionRequestMessage> {
    messages
        .iter()
        .filter(|message| {
            message.is_role(ChatCompletionRole::Tool)
                || message.is_role(ChatCompletionRole::Function)
                || (message.is_role(ChatCompletionRole::Assistant)
                    && message.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty()))
        })
        .collect()
}

/// Appends the tool section to echoed content when there is anything to show.
pub fn append_tool_section(
    content: &mut String,
    messages: &[ChatCompletionRequestMessage],
) -> RelayResult<()> {
    let tool_messages = extract_tool_messages(messages);
    if tool_messages.is_empty() {
        return Ok(());
    }
    let rendered = serde_json::to_string_pretty(&tool_messages)
        .map_err(|err| RelayError::Adapter(err.to_string()))?;
    content.push_str(TOOL_SECTION_HEADER);
    content.push_str(&rendered);
    Ok(())
}
