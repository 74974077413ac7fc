use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::{CompletionError, PipelineError};
use crate::prompt::PromptText;

pub mod anthropic;
#[cfg(test)]
pub mod fake;
pub mod offline;
pub mod openai;
pub mod retry;

/// Per-call generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A text-completion backend. Returns the generated text, never empty.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &PromptText, params: &CompletionParams) -> Result<String, CompletionError>;
}

pub type DynClient = Arc<dyn CompletionClient>;

/// Build the configured client. `--dry-run` gets the offline client and needs no credential.
pub fn make_client(cfg: &Config, api_key: Option<String>, dry_run: bool) -> Result<DynClient, PipelineError> {
    if dry_run {
        return Ok(Arc::new(offline::OfflineClient));
    }
    let key = api_key.ok_or_else(|| {
        PipelineError::Config(format!("{} is not set", cfg.provider.api_key_var()))
    })?;
    let timeout = Duration::from_secs(cfg.timeout_secs);
    match cfg.provider {
        ProviderKind::OpenAI => Ok(Arc::new(openai::OpenAIClient::new(key, cfg.openai_api_base.clone(), timeout)?)),
        ProviderKind::Anthropic => Ok(Arc::new(anthropic::AnthropicClient::new(
            key,
            cfg.anthropic_api_base.clone(),
            timeout,
        )?)),
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, PipelineError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PipelineError::Config(format!("building HTTP client: {e}")))
}

pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Map a non-success HTTP status onto the completion error taxonomy.
pub(crate) fn classify_status(status: StatusCode, retry_after: Option<Duration>, body: &str) -> CompletionError {
    let detail = format!("HTTP {status}: {}", truncate(body, 300));
    match status.as_u16() {
        401 | 403 => CompletionError::Auth(detail),
        429 => CompletionError::RateLimited { retry_after },
        500..=599 => CompletionError::Service(detail),
        _ => CompletionError::InvalidResponse(detail),
    }
}

/// Transport failures (timeouts, refused connections, dropped streams) are transient.
pub(crate) fn classify_transport(err: reqwest::Error) -> CompletionError {
    if err.is_timeout() {
        CompletionError::Service(format!("request timed out: {err}"))
    } else {
        CompletionError::Service(err.to_string())
    }
}

/// Reject empty and whitespace-only completions.
pub(crate) fn non_empty(text: Option<String>) -> Result<String, CompletionError> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(CompletionError::InvalidResponse("completion was empty".into())),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
