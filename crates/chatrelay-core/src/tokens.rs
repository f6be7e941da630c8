use chatrelay_protocol::openai::create_chat_completions::types::CompletionUsage;

/// Token counting collaborator. The counting formula lives with the
/// implementor; the relay only sums and reports.
pub trait TokenEstimator: Send + Sync {
    fn count(&self, text: &str) -> i64;
}

impl<F> TokenEstimator for F
where
    F: Fn(&str) -> i64 + Send + Sync,
{
    fn count(&self, text: &str) -> i64 {
        self(text)
    }
}

pub fn usage_for(estimator: &dyn TokenEstimator, content: &str, prompt_tokens: i64) -> CompletionUsage {
    CompletionUsage::new(prompt_tokens, estimator.count(content))
}
