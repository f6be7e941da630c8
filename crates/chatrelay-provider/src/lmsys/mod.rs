pub mod message;

use std::sync::Arc;

use async_trait::async_trait;
use chatrelay_core::{MatcherChain, RelayError, RelayResult, RequestContext, wait_response};
use tracing::info;

use crate::backend::ChatBackend;
use crate::connector::LmsysConnector;
use crate::echo::echo_prompt;
use crate::kind::BackendKind;
use crate::role::RoleTemplate;

pub use message::merge_messages;

pub struct LmsysBackend {
    connector: Option<Arc<dyn LmsysConnector>>,
}

impl LmsysBackend {
    pub fn new(connector: Option<Arc<dyn LmsysConnector>>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ChatBackend for LmsysBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Lmsys
    }

    async fn completion(
        &self,
        ctx: &mut RequestContext,
        matchers: &mut MatcherChain,
        model: &str,
    ) -> RelayResult<()> {
        let template = RoleTemplate::for_model(model);
        let prompt = merge_messages(&ctx.completion.messages, ctx.hints.specialized, template);
        ctx.prompt_tokens = ctx.count_tokens(&prompt);

        if ctx.hints.echo {
            return echo_prompt(ctx, prompt).await;
        }

        let connector = self
            .connector
            .as_ref()
            .ok_or_else(|| RelayError::Unavailable("lmsys backend is not configured".to_string()))?;
        info!(
            event = "backend_dispatch",
            trace_id = %ctx.trace_id,
            backend = "lmsys",
            model = %model,
            prompt_tokens = ctx.prompt_tokens
        );
        let rx = connector.chat(model, prompt).await?;
        wait_response(ctx, matchers, rx).await;
        Ok(())
    }
}
