use async_trait::async_trait;

use super::{CompletionClient, CompletionParams};
use crate::context::excerpt::{MILESTONE_END, MILESTONE_START};
use crate::errors::CompletionError;
use crate::prompt::PromptText;

/// Deterministic stand-in used by `--dry-run`. Makes no network calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineClient;

#[async_trait]
impl CompletionClient for OfflineClient {
    async fn complete(&self, prompt: &PromptText, params: &CompletionParams) -> Result<String, CompletionError> {
        let first_line = prompt
            .user
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("(empty instruction)");

        let mut out = format!(
            "_Offline draft ({} would receive {} prompt characters)._\n\n{first_line}\n",
            params.model,
            prompt.user.chars().count()
        );
        if prompt.user.contains(MILESTONE_START) {
            out.push_str(&format!(
                "\n{MILESTONE_START}\n## Milestone 1 - Offline Skeleton\n\n**Goal:** Placeholder milestone\n{MILESTONE_END}\n"
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_output_is_deterministic_and_non_empty() {
        let prompt = PromptText { system: None, user: "\n  Describe the product.\nmore".into() };
        let params = CompletionParams { model: "gpt-4o".into(), temperature: 0.0, max_tokens: 1 };
        let a = OfflineClient.complete(&prompt, &params).await.unwrap();
        let b = OfflineClient.complete(&prompt, &params).await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains("Describe the product."));
    }
}
