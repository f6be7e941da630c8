use async_trait::async_trait;
use chatrelay_core::{RelayError, RelayResult};
use chatrelay_protocol::openai::create_chat_completions::request::CreateChatCompletionRequest;
use chatrelay_protocol::openai::create_chat_completions::types::{
    ChatCompletionRequestMessage, ChatCompletionRole,
};
use regex::Regex;
use tracing::info;

use super::ImageSpace;

/// Marks a prompt that must be used verbatim, without a tag completion.
pub const NO_LLM_TAG: &str = "<tag llm=false />";

const TAG_PATTERN: &str = r#"<tag content="([^>]+)"\s?/>"#;
const QUOTE_FENCE: &str = r#"""""#;
const CODE_FENCE: &str = "```";
const PROMPT_SUFFIX: &str = ", {{{{by famous artist}}}, beautiful, masterpiece, 4k";

const TAG_WORDS: &str = "Turn the description below into a comma separated list of \
English stable-diffusion prompt tags, most important first. Reply with the tags \
wrapped in triple double quotes and nothing else.\n\nDescription: {{content}}";

const SENTENCE_WORDS: &str = "Rewrite the description below as one vivid English \
sentence for an image model. Reply with the sentence wrapped in triple double quotes \
and nothing else.\n\nDescription: {{content}}";

/// Inline `<tag content="..."/>` values plus the free text around them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPrompt {
    pub tags: Vec<String>,
    pub remainder: String,
}

pub fn parse_tags(content: &str) -> RelayResult<TagPrompt> {
    let pattern = Regex::new(TAG_PATTERN).map_err(|err| RelayError::Adapter(err.to_string()))?;
    let tags = pattern
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|value| value.as_str().to_string())
        .collect();
    let remainder = pattern.replace_all(content, "").trim().to_string();
    Ok(TagPrompt { tags, remainder })
}

/// What is still needed to turn a user prompt into an image prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagPlan {
    Ready(String),
    /// Ask a chat model with `request`, then append its answer to `tags`.
    Complete { tags: Vec<String>, request: String },
}

pub fn plan(space: ImageSpace, content: &str) -> RelayResult<TagPlan> {
    let TagPrompt { mut tags, remainder } = parse_tags(content)?;
    if remainder.is_empty() {
        return Ok(TagPlan::Ready(tags.join(", ")));
    }
    if remainder.contains(NO_LLM_TAG) {
        tags.push(remainder.replace(NO_LLM_TAG, ""));
        return Ok(TagPlan::Ready(tags.join(", ")));
    }
    let words = if space.wants_sentence() {
        SENTENCE_WORDS
    } else {
        TAG_WORDS
    };
    Ok(TagPlan::Complete {
        tags,
        request: words.replace("{{content}}", &remainder),
    })
}

/// Pulls the generated prompt out of a chat answer.
///
/// Accepts a `"""` block, a trailing `"""` whose opener was dropped, or a
/// fenced code block; quotes inside the answer are removed.
pub fn extract_answer(message: &str) -> RelayResult<String> {
    let message = message.trim();
    if let Some(inner) = between(message, QUOTE_FENCE) {
        return Ok(inner.replace('"', ""));
    }
    if let Some(inner) = message.strip_suffix(QUOTE_FENCE) {
        return Ok(inner.replace('"', ""));
    }
    if let Some(inner) = between(message, CODE_FENCE) {
        return Ok(inner.replace('"', ""));
    }
    Err(RelayError::Adapter(
        "tag completion returned no prompt block".to_string(),
    ))
}

fn between<'a>(message: &'a str, fence: &str) -> Option<&'a str> {
    let left = message.find(fence)?;
    let right = message.rfind(fence)?;
    (left + fence.len() <= right).then(|| &message[left + fence.len()..right])
}

/// Chat completion used to expand free text into image tags.
#[async_trait]
pub trait TagCompleter: Send + Sync {
    async fn complete(&self, request: CreateChatCompletionRequest) -> RelayResult<String>;
}

pub fn completion_request(model: &str, request: &str) -> CreateChatCompletionRequest {
    let mut completion = CreateChatCompletionRequest::new(
        model,
        vec![ChatCompletionRequestMessage::new(
            ChatCompletionRole::User,
            request,
        )],
    );
    completion.temperature = Some(0.8);
    completion.max_tokens = Some(4096);
    completion
}

/// Resolves a user prompt into the comma-joined tag prompt for `space`.
pub async fn complete_tags(
    space: ImageSpace,
    content: &str,
    model: &str,
    completer: &dyn TagCompleter,
) -> RelayResult<String> {
    match plan(space, content)? {
        TagPlan::Ready(prompt) => Ok(prompt),
        TagPlan::Complete { mut tags, request } => {
            let answer = completer
                .complete(completion_request(model, &request))
                .await?;
            tags.push(extract_answer(&answer)?);
            let prompt = tags.join(", ");
            info!(event = "tags_completed", space = space.name(), model = %model, prompt = %prompt);
            Ok(prompt)
        }
    }
}

/// Strips whitespace, full stops and newlines the image backends choke on.
pub fn sanitize_prompt(message: &str) -> String {
    message
        .trim()
        .replace('。', "")
        .replace('.', "")
        .replace('\n', "")
}

/// Prompt echoed back to the client alongside the generated image.
pub fn decorate_prompt(message: &str) -> String {
    let mut prompt = String::with_capacity(message.len() + PROMPT_SUFFIX.len());
    prompt.push_str(message);
    prompt.push_str(PROMPT_SUFFIX);
    prompt
}
