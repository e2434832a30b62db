//! Canned completions for tests and offline runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ChatMessage, CompletionError, CompletionService, SamplingParams};

/// Replays queued replies in order, then falls back to a fixed reply.
///
/// Every request is recorded so callers can inspect what was sent.
pub struct ScriptedCompletion {
    queue: Mutex<VecDeque<Result<String, String>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<(Vec<ChatMessage>, SamplingParams)>>,
}

impl ScriptedCompletion {
    /// Always answer with `reply`
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Some(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with a provider error
    pub fn failing() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a one-off reply ahead of the fallback
    pub fn then_reply(self, reply: impl Into<String>) -> Self {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(Ok(reply.into()));
        }
        self
    }

    /// Queue a one-off failure ahead of the fallback
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(Err(message.into()));
        }
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<(Vec<ChatMessage>, SamplingParams)> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    fn model_name(&self) -> String {
        "scripted/test".to_string()
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<String, CompletionError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((messages.to_vec(), *params));
        }

        let next = self.queue.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(CompletionError::Provider(message)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| CompletionError::Provider("scripted failure".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_fallback() {
        let llm = ScriptedCompletion::replying("default")
            .then_reply("first")
            .then_fail("boom");
        let params = SamplingParams::default();
        let msgs = [ChatMessage::user("x")];

        assert_eq!(llm.complete(&msgs, &params).await.unwrap(), "first");
        assert!(llm.complete(&msgs, &params).await.is_err());
        assert_eq!(llm.complete(&msgs, &params).await.unwrap(), "default");
        assert_eq!(llm.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_failing() {
        let llm = ScriptedCompletion::failing();
        let err = llm
            .complete(&[ChatMessage::user("x")], &SamplingParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "provider");
    }
}
