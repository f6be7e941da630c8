pub mod message;

use std::sync::Arc;

use async_trait::async_trait;
use chatrelay_core::{MatcherChain, RelayError, RelayResult, RequestContext, wait_response};
use tracing::info;

use crate::backend::ChatBackend;
use crate::connector::{CozeConnector, CozeMessage};
use crate::echo::echo_prompt;
use crate::kind::BackendKind;
use crate::role::RoleTemplate;

pub use message::{echo_messages, merge_messages};

pub struct CozeBackend {
    connector: Option<Arc<dyn CozeConnector>>,
}

impl CozeBackend {
    pub fn new(connector: Option<Arc<dyn CozeConnector>>) -> Self {
        Self { connector }
    }
}

/// Sum of the estimator's count over every message sent to the bot.
pub fn prompt_tokens(ctx: &RequestContext, messages: &[CozeMessage]) -> i64 {
    messages
        .iter()
        .map(|message| ctx.count_tokens(&message.content))
        .sum()
}

#[async_trait]
impl ChatBackend for CozeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Coze
    }

    async fn completion(
        &self,
        ctx: &mut RequestContext,
        matchers: &mut MatcherChain,
        bot: &str,
    ) -> RelayResult<()> {
        let template = RoleTemplate::for_model(bot);
        let messages = merge_messages(&ctx.completion.messages, ctx.hints.specialized, template);
        ctx.prompt_tokens = prompt_tokens(ctx, &messages);

        if ctx.hints.echo {
            return echo_prompt(ctx, echo_messages(&messages, template)).await;
        }

        let connector = self
            .connector
            .as_ref()
            .ok_or_else(|| RelayError::Unavailable("coze backend is not configured".to_string()))?;
        info!(
            event = "backend_dispatch",
            trace_id = %ctx.trace_id,
            backend = "coze",
            bot = %bot,
            messages = messages.len(),
            prompt_tokens = ctx.prompt_tokens
        );
        let rx = connector.chat(bot, messages).await?;
        wait_response(ctx, matchers, rx).await;
        Ok(())
    }
}
