//! Scripted completion client for tests in downstream crates.

use async_trait::async_trait;
use mindmenders_core::HistoryTurn;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::error::{LLMError, Result};
use crate::provider::CompletionClient;

/// One recorded `complete` call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub history: Vec<HistoryTurn>,
    pub prompt: String,
}

/// Replies from a queue and records every request.
/// Once the queue is empty every call fails with a network error.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().push_back(Ok(text.into()));
        self
    }

    pub fn with_error(self, error: LLMError) -> Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn provider_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, history: &[HistoryTurn], prompt: &str) -> Result<String> {
        self.calls.lock().push(RecordedCall {
            history: history.to_vec(),
            prompt: prompt.to_string(),
        });
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(LLMError::Network("no scripted reply left".to_string())))
    }

    async fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let client = ScriptedClient::new()
            .with_reply("first")
            .with_error(LLMError::EmptyResponse);

        assert_eq!(client.complete(&[], "a").await.unwrap(), "first");
        assert!(matches!(client.complete(&[], "b").await, Err(LLMError::EmptyResponse)));
        assert!(matches!(client.complete(&[], "c").await, Err(LLMError::Network(_))));

        let prompts: Vec<_> = client.calls().into_iter().map(|call| call.prompt).collect();
        assert_eq!(prompts, vec!["a", "b", "c"]);
    }
}
