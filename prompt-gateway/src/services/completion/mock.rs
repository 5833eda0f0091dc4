//! Mock backend for tests and local runs without an API key.

use super::{CompletionBackend, CompletionError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One exchange seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub system_context: String,
    pub user_prompt: String,
}

#[derive(Debug, Clone)]
enum Behavior {
    Candidates(Vec<String>),
    Fail(String),
}

/// Deterministic backend. Clones share the call log.
#[derive(Debug, Clone)]
pub struct MockBackend {
    behavior: Behavior,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockBackend {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_candidates(vec![text.into()])
    }

    pub fn with_candidates(candidates: Vec<String>) -> Self {
        Self {
            behavior: Behavior::Candidates(candidates),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Succeeds with zero candidates.
    pub fn empty() -> Self {
        Self::with_candidates(Vec::new())
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Fail(message.into()),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(
        &self,
        system_context: &str,
        user_prompt: &str,
    ) -> Result<Vec<String>, CompletionError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                system_context: system_context.to_string(),
                user_prompt: user_prompt.to_string(),
            });
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Candidates(candidates) => Ok(candidates.clone()),
            Behavior::Fail(message) => Err(CompletionError::Backend(message.clone())),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
