//! Completion backend abstraction.
//!
//! `CompletionBackend` is the seam to the external model: one system message
//! plus one user message in, candidate texts out. `CompletionClient` wraps a
//! backend with the per-call timeout and the shutdown cancellation token.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Error type for completion calls.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Rate limited by backend")]
    RateLimited,

    #[error("no completion found")]
    EmptyCompletion,

    #[error("Backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend call cancelled by shutdown")]
    Cancelled,
}

impl From<CompletionError> for AppError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Cancelled => AppError::ServiceUnavailable,
            other => AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}

/// Trait for chat-style completion backends.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends the two-message exchange and returns every candidate text.
    async fn complete(
        &self,
        system_context: &str,
        user_prompt: &str,
    ) -> Result<Vec<String>, CompletionError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

#[derive(Clone)]
pub struct CompletionClient {
    backend: Arc<dyn CompletionBackend>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl CompletionClient {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            timeout,
            cancel,
        }
    }

    /// Returns the first candidate produced for the exchange.
    pub async fn complete(
        &self,
        system_context: &str,
        user_prompt: &str,
    ) -> Result<String, CompletionError> {
        tracing::debug!(
            model = %self.backend.model(),
            prompt_len = user_prompt.len(),
            "Sending completion request"
        );

        let call = tokio::time::timeout(
            self.timeout,
            self.backend.complete(system_context, user_prompt),
        );

        let candidates = tokio::select! {
            _ = self.cancel.cancelled() => return Err(CompletionError::Cancelled),
            result = call => result.map_err(|_| CompletionError::Timeout(self.timeout))??,
        };

        match candidates.into_iter().next() {
            Some(text) => {
                tracing::info!("Chat completion received successfully");
                Ok(text)
            }
            None => {
                tracing::warn!("No completion found in the response");
                Err(CompletionError::EmptyCompletion)
            }
        }
    }
}
