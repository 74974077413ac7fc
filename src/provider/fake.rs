use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{CompletionClient, CompletionParams};
use crate::errors::CompletionError;
use crate::prompt::PromptText;

type Reply = Result<String, CompletionError>;

/// Scripted client for tests. Rules match on the user prompt and take priority over the
/// reply queue; with both exhausted every call gets `"generated <n>"`.
#[derive(Default)]
pub struct FakeClient {
    rules: Vec<(String, Reply)>,
    hangs: Vec<String>,
    queue: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<PromptText>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self { queue: Mutex::new(replies.into_iter().collect()), ..Self::default() }
    }

    /// Answer every prompt containing `needle` with `reply`.
    pub fn on(mut self, needle: &str, reply: Reply) -> Self {
        self.rules.push((needle.to_string(), reply));
        self
    }

    /// Never answer a prompt containing `needle`.
    pub fn hang_on(mut self, needle: &str) -> Self {
        self.hangs.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<PromptText> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FakeClient {
    async fn complete(&self, prompt: &PromptText, _params: &CompletionParams) -> Reply {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(prompt.clone());
            calls.len()
        };
        if self.hangs.iter().any(|needle| prompt.user.contains(needle.as_str())) {
            return std::future::pending::<Reply>().await;
        }
        if let Some((_, reply)) = self.rules.iter().find(|(needle, _)| prompt.user.contains(needle.as_str())) {
            return reply.clone();
        }
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("generated {n}")))
    }
}
