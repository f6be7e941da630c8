use chatrelay_protocol::openai::create_chat_completions::request::CreateChatCompletionRequest;
use chatrelay_protocol::openai::create_chat_completions::types::ChatCompletionRole;

use crate::error::{RelayError, RelayResult};

/// Rejects empty conversations and unknown roles, naming the offending index.
pub fn validate_messages(request: &CreateChatCompletionRequest) -> RelayResult<()> {
    if request.messages.is_empty() {
        return Err(RelayError::Validation(
            "[] is too short - 'messages'".to_string(),
        ));
    }
    for (index, message) in request.messages.iter().enumerate() {
        if message.role().is_none() {
            let accepted = ChatCompletionRole::ACCEPTED
                .iter()
                .map(|role| format!("'{role}'"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(RelayError::Validation(format!(
                "'{}' is not in [{accepted}] - 'messages.[{index}].role'",
                message.role
            )));
        }
    }
    Ok(())
}
