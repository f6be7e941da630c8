use chatrelay_protocol::openai::create_chat_completions::types::{
    ChatCompletionRequestMessage, ChatCompletionRole,
};

use crate::connector::CozeMessage;
use crate::role::RoleTemplate;

/// Folds the conversation into what a coze bot accepts.
///
/// A leading system turn stays a dedicated system message; everything else
/// is rendered through `template` into one synthesized user message. In
/// specialized mode a claude-style 3-turn exchange collapses to the first
/// turn's content alone.
pub fn merge_messages(
    messages: &[ChatCompletionRequestMessage],
    specialized: bool,
    template: RoleTemplate,
) -> Vec<CozeMessage> {
    if specialized && template.is_claude() && messages.len() == 3 {
        return vec![CozeMessage::new("user", messages[0].content_text())];
    }

    let mut merged = Vec::with_capacity(2);
    let mut rest = messages;
    if let Some((first, tail)) = messages.split_first()
        && first.is_role(ChatCompletionRole::System)
    {
        merged.push(CozeMessage::new("system", first.content_text()));
        rest = tail;
    }

    let transcript: String = rest
        .iter()
        .map(|message| template.render(&message.role, &message.content_text()))
        .collect();
    merged.push(CozeMessage::new("user", transcript));
    merged
}

/// Re-renders merged messages as the text a human would read.
pub fn echo_messages(messages: &[CozeMessage], template: RoleTemplate) -> String {
    messages
        .iter()
        .map(|message| template.render(&message.role, &message.content))
        .collect()
}
