//! Scripted language model for testing.
//!
//! Replays a queue of canned replies in order and records every request it
//! receives, so tests can drive the classifier without network access and
//! assert on how often the provider was called.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::adapter::LanguageModel;
use crate::error::{LlmError, LlmResult};
use crate::types::{Completion, CompletionRequest};

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this text.
    Text(String),
    /// Fail with an API error carrying this body.
    Fail(String),
    /// Sleep, then return this text.
    Delayed(Duration, String),
}

/// Mock language model for testing.
#[derive(Clone)]
pub struct ScriptedModel {
    model: String,
    replies: Arc<RwLock<Vec<ScriptedReply>>>,
    reply_index: Arc<AtomicUsize>,
    captured: Arc<RwLock<Vec<CompletionRequest>>>,
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            model: "scripted".to_string(),
            replies: Arc::new(RwLock::new(Vec::new())),
            reply_index: Arc::new(AtomicUsize::new(0)),
            captured: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue a plain text reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.write().push(ScriptedReply::Text(text.into()));
        self
    }

    /// Queue a provider failure.
    pub fn fail(self, body: impl Into<String>) -> Self {
        self.replies.write().push(ScriptedReply::Fail(body.into()));
        self
    }

    /// Queue a reply that only arrives after `delay`.
    pub fn delayed(self, delay: Duration, text: impl Into<String>) -> Self {
        self.replies
            .write()
            .push(ScriptedReply::Delayed(delay, text.into()));
        self
    }

    /// Number of completion requests received so far.
    pub fn call_count(&self) -> usize {
        self.captured.read().len()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.captured.read().clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.captured.read().last().cloned()
    }

    fn next_reply(&self) -> Option<ScriptedReply> {
        let index = self.reply_index.fetch_add(1, Ordering::SeqCst);
        self.replies.read().get(index).cloned()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<Completion> {
        self.captured.write().push(request.clone());

        match self.next_reply() {
            Some(ScriptedReply::Text(text)) => Ok(Completion::text(&self.model, text)),
            Some(ScriptedReply::Fail(body)) => Err(LlmError::api("scripted", 503, body)),
            Some(ScriptedReply::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(Completion::text(&self.model, text))
            }
            None => Err(LlmError::EmptyCompletion("scripted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new(vec![ChatMessage::user(text)])
    }

    #[tokio::test]
    async fn test_replies_in_order_and_captures_requests() {
        let model = ScriptedModel::new().reply("billing").fail("down");

        let first = model.complete(&request("one")).await.unwrap();
        assert_eq!(first.content, "billing");

        let second = model.complete(&request("two")).await;
        assert!(matches!(second, Err(LlmError::Api { status: 503, .. })));

        assert_eq!(model.call_count(), 2);
        assert_eq!(
            model.last_request().unwrap().last_user_message(),
            Some("two")
        );
    }

    #[tokio::test]
    async fn test_exhausted_script_is_an_error() {
        let model = ScriptedModel::new();
        let result = model.complete(&request("anything")).await;
        assert!(matches!(result, Err(LlmError::EmptyCompletion(_))));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let model = ScriptedModel::new().reply("a").reply("b");
        let clone = model.clone();

        assert_eq!(model.complete(&request("x")).await.unwrap().content, "a");
        assert_eq!(clone.complete(&request("y")).await.unwrap().content, "b");
        assert_eq!(model.call_count(), 2);
    }
}
