use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{classify_status, classify_transport, non_empty, CompletionClient, CompletionParams};
use crate::errors::{CompletionError, PipelineError};
use crate::prompt::PromptText;

const API_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    api_base: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, api_base: String, timeout: Duration) -> Result<Self, PipelineError> {
        Ok(Self { client: super::http_client(timeout)?, api_key, api_base })
    }
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Msg<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    #[serde(default)]
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

fn parse_reply(text: &str) -> Result<String, CompletionError> {
    let parsed: MsgResponse = serde_json::from_str(text)
        .map_err(|e| CompletionError::InvalidResponse(format!("unparsable Anthropic response: {e}")))?;
    let joined = parsed
        .content
        .into_iter()
        .filter(|b| b.r#type == "text")
        .map(|b| b.text)
        .collect::<Vec<_>>()
        .join("");
    non_empty(Some(joined))
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(&self, prompt: &PromptText, params: &CompletionParams) -> Result<String, CompletionError> {
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        let body = MsgRequest {
            model: &params.model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            messages: vec![Msg { role: "user", content: &prompt.user }],
            system: prompt.system.as_deref(),
        };
        debug!(%url, model = %params.model, "anthropic request");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = resp.status();
        let retry_after = super::retry_after(resp.headers());
        let text = resp.text().await.map_err(classify_transport)?;
        debug!(%status, body_bytes = text.len(), "anthropic response");

        if !status.is_success() {
            return Err(classify_status(status, retry_after, &text));
        }
        parse_reply(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_blocks_are_joined() {
        let body = r#"{"content":[{"type":"text","text":"Hello "},{"type":"tool_use"},{"type":"text","text":"world"}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "Hello world");
    }

    #[test]
    fn no_text_is_invalid() {
        assert!(matches!(parse_reply(r#"{"content":[]}"#), Err(CompletionError::InvalidResponse(_))));
    }
}
