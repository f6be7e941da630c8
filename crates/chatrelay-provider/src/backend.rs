use std::sync::Arc;

use async_trait::async_trait;
use chatrelay_core::{MatcherChain, RelayResult, RequestContext};

use crate::connector::{CozeConnector, LmsysConnector};
use crate::coze::CozeBackend;
use crate::kind::BackendKind;
use crate::lmsys::LmsysBackend;

/// One request lifecycle against a backend: adapt, dispatch, consume, emit.
///
/// An `Err` means nothing usable was emitted by the backend path; the caller
/// renders it if the response has not been sent yet.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn completion(
        &self,
        ctx: &mut RequestContext,
        matchers: &mut MatcherChain,
        model: &str,
    ) -> RelayResult<()>;
}

#[derive(Clone)]
pub struct BackendRegistry {
    coze: Arc<CozeBackend>,
    lmsys: Arc<LmsysBackend>,
}

impl BackendRegistry {
    pub fn new(
        coze: Option<Arc<dyn CozeConnector>>,
        lmsys: Option<Arc<dyn LmsysConnector>>,
    ) -> Self {
        Self {
            coze: Arc::new(CozeBackend::new(coze)),
            lmsys: Arc::new(LmsysBackend::new(lmsys)),
        }
    }

    /// Registry without transports; only echo requests can succeed.
    pub fn echo_only() -> Self {
        Self::new(None, None)
    }

    pub fn get(&self, kind: BackendKind) -> Arc<dyn ChatBackend> {
        match kind {
            BackendKind::Coze => self.coze.clone(),
            BackendKind::Lmsys => self.lmsys.clone(),
        }
    }
}
