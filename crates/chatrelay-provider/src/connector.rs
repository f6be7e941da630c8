use async_trait::async_trait;
use chatrelay_core::{FragmentReceiver, RelayResult};
use serde::{Deserialize, Serialize};

/// One entry of a coze bot conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CozeMessage {
    pub role: String,
    pub content: String,
}

impl CozeMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Transport to a coze bot.
///
/// Implementations spawn their own producer task and return the receiving
/// end; dropping the sender ends the response.
#[async_trait]
pub trait CozeConnector: Send + Sync {
    async fn chat(&self, bot: &str, messages: Vec<CozeMessage>) -> RelayResult<FragmentReceiver>;
}

/// Transport to an lmsys arena model, which takes a single prompt string.
#[async_trait]
pub trait LmsysConnector: Send + Sync {
    async fn chat(&self, model: &str, prompt: String) -> RelayResult<FragmentReceiver>;
}
