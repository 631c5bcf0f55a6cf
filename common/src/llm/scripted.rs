use crate::error::{AskDbError, Result};
use crate::llm::model::{flatten_messages, LanguageModel, Message};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// model that replays canned replies in order and records every request
///
/// stands in for a real backend in tests and offline runs.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// queue a reply
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_replies().push_back(Ok(reply.into()));
    }

    /// queue a failing call
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_replies().push_back(Err(message.into()));
    }

    pub fn call_count(&self) -> usize {
        self.lock_requests().len()
    }

    /// every request seen so far, flattened to a single prompt string
    pub fn prompts(&self) -> Vec<String> {
        self.lock_requests()
            .iter()
            .map(|messages| flatten_messages(messages))
            .collect()
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.lock_requests().clone()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<std::result::Result<String, String>>> {
        self.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_requests(&self) -> std::sync::MutexGuard<'_, Vec<Vec<Message>>> {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, messages: Vec<Message>) -> Result<String> {
        self.lock_requests().push(messages);

        match self.lock_replies().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(AskDbError::Model(message)),
            None => Err(AskDbError::Model(
                "scripted model has no replies left".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order() {
        let model = ScriptedModel::new(["first", "second"]);

        assert_eq!(model.generate(vec![Message::user("a")]).await.unwrap(), "first");
        assert_eq!(model.generate(vec![Message::user("b")]).await.unwrap(), "second");
        assert_eq!(model.call_count(), 2);
        assert_eq!(model.prompts()[1], "[user]\nb");
    }

    #[tokio::test]
    async fn test_exhausted_and_failing_replies() {
        let model = ScriptedModel::default();
        model.push_failure("connection reset");

        let err = model.generate(vec![Message::user("a")]).await.unwrap_err();
        assert_eq!(err.to_string(), "model error: connection reset");

        let err = model.generate(vec![Message::user("b")]).await.unwrap_err();
        assert!(matches!(err, AskDbError::Model(_)));
        assert_eq!(model.call_count(), 2);
    }
}
