use chatrelay_protocol::openai::create_chat_completions::types::ChatCompletionRequestMessage;

use crate::role::{RoleTemplate, TAGGED_TERMINATOR};

/// Flattens the conversation into one prompt string.
///
/// Every turn, system included, goes through `template`; a dangling tagged
/// terminator at the very end is dropped.
pub fn merge_messages(
    messages: &[ChatCompletionRequestMessage],
    specialized: bool,
    template: RoleTemplate,
) -> String {
    if specialized && template.is_claude() && messages.len() == 3 {
        return messages[0].content_text();
    }

    let prompt: String = messages
        .iter()
        .map(|message| template.render(&message.role, &message.content_text()))
        .collect();
    match prompt.strip_suffix(TAGGED_TERMINATOR) {
        Some(trimmed) => trimmed.to_string(),
        None => prompt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_protocol::openai::create_chat_completions::types::ChatCompletionRole;

    fn conversation() -> Vec<ChatCompletionRequestMessage> {
        vec![
            ChatCompletionRequestMessage::new(ChatCompletionRole::System, "S"),
            ChatCompletionRequestMessage::new(ChatCompletionRole::User, "U"),
            ChatCompletionRequestMessage::new(ChatCompletionRole::Assistant, "A"),
        ]
    }

    #[test]
    fn tagged_prompt_drops_last_terminator() {
        assert_eq!(
            merge_messages(&conversation(), false, RoleTemplate::Tagged),
            "<|system|>\nS<|end|>\n\n<|user|>\nU<|end|>\n\n<|assistant|>\nA"
        );
    }

    #[test]
    fn claude_prompt() {
        assert_eq!(
            merge_messages(&conversation(), false, RoleTemplate::Claude),
            "S\n\nHuman: U\n\nAssistant: A"
        );
    }

    #[test]
    fn specialized_uses_first_content() {
        assert_eq!(merge_messages(&conversation(), true, RoleTemplate::Claude), "S");
    }
}
