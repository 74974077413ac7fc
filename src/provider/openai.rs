use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{classify_status, classify_transport, non_empty, CompletionClient, CompletionParams};
use crate::errors::{CompletionError, PipelineError};
use crate::prompt::PromptText;

/// OpenAI chat-completions backend.
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    api_base: String,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, timeout: Duration) -> Result<Self, PipelineError> {
        Ok(Self { client: super::http_client(timeout)?, api_key, api_base })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

fn request_body<'a>(prompt: &'a PromptText, params: &'a CompletionParams) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &prompt.system {
        messages.push(ChatMessage { role: "system", content: system });
    }
    messages.push(ChatMessage { role: "user", content: &prompt.user });
    ChatRequest { model: &params.model, messages, temperature: params.temperature, max_tokens: params.max_tokens }
}

fn parse_reply(text: &str) -> Result<String, CompletionError> {
    let parsed: ChatResponse = serde_json::from_str(text)
        .map_err(|e| CompletionError::InvalidResponse(format!("unparsable OpenAI response: {e}")))?;
    non_empty(parsed.choices.into_iter().next().and_then(|c| c.message.content))
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(&self, prompt: &PromptText, params: &CompletionParams) -> Result<String, CompletionError> {
        let url = format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'));
        debug!(%url, model = %params.model, prompt_chars = prompt.user.len(), "openai request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body(prompt, params))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = resp.status();
        let retry_after = super::retry_after(resp.headers());
        let text = resp.text().await.map_err(classify_transport)?;
        debug!(%status, body_bytes = text.len(), "openai response");

        if !status.is_success() {
            return Err(classify_status(status, retry_after, &text));
        }
        parse_reply(&text)
    }
}
