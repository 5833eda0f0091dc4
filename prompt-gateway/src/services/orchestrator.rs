//! Builds completion requests from caller input and a steering template.

use crate::dtos::{GenerateRequest, GenerateResponse, SummaryRequest, SummaryResponse};
use crate::services::completion::CompletionClient;
use crate::services::prompt_store::{PromptStore, PromptStoreError};
use service_core::error::AppError;

/// Template steering `/generate`.
pub const NOTES_TEMPLATE: &str = "notes.prompt";
/// Template steering `/summary`.
pub const SUMMARY_TEMPLATE: &str = "summary.prompt";

pub fn generate_prompt(date: &str, prompt: &str) -> String {
    format!(
        "Create a Jira Comment based on the following information strictly and only for the date of {}:\n{}",
        date, prompt
    )
}

pub fn summary_prompt(text: &str) -> String {
    format!("Please summarize the following text:\n\n{}", text)
}

#[derive(Clone)]
pub struct RequestOrchestrator {
    prompts: PromptStore,
    completions: CompletionClient,
}

impl RequestOrchestrator {
    pub fn new(prompts: PromptStore, completions: CompletionClient) -> Self {
        Self {
            prompts,
            completions,
        }
    }

    pub async fn generate(&self, req: GenerateRequest) -> Result<GenerateResponse, AppError> {
        tracing::info!(date = %req.date, "Received generate request");

        let system_context = self.steering_template(NOTES_TEMPLATE).await?;
        let completion = self
            .completions
            .complete(&system_context, &generate_prompt(&req.date, &req.prompt))
            .await
            .map_err(|e| {
                tracing::error!("Error getting completion: {}", e);
                AppError::from(e)
            })?;

        tracing::info!("Completion generated successfully");
        Ok(GenerateResponse { completion })
    }

    pub async fn summarize(&self, req: SummaryRequest) -> Result<SummaryResponse, AppError> {
        tracing::info!("Received summary request");

        let system_context = self.steering_template(SUMMARY_TEMPLATE).await?;
        let summary = self
            .completions
            .complete(&system_context, &summary_prompt(&req.prompt))
            .await
            .map_err(|e| {
                tracing::error!("Error getting summary: {}", e);
                AppError::from(e)
            })?;

        tracing::info!("Summary generated successfully");
        Ok(SummaryResponse {
            summary: summary.trim().to_string(),
        })
    }

    /// Reads a steering template; a missing one is a server fault, not a client one.
    async fn steering_template(&self, name: &str) -> Result<String, AppError> {
        self.prompts.get(name).await.map_err(|e| {
            let context = match &e {
                PromptStoreError::NotFound(_) => format!("Steering template {} missing", name),
                _ => format!("Failed to read steering template {}", name),
            };
            tracing::error!("{}: {}", context, e);
            AppError::InternalError(anyhow::Error::new(e).context(context))
        })
    }
}
