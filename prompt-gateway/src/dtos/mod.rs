//! Request and response bodies.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

/// JSON body extractor that reports every decoding failure as a 400.
///
/// The content type is not checked. Bodies over the router's body limit are
/// reported as 413.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge(anyhow::anyhow!("Request body too large: {}", e))
            } else {
                AppError::BadRequest(anyhow::anyhow!("Failed to read request body: {}", e))
            }
        })?;

        serde_json::from_slice(&bytes).map(JsonBody).map_err(|e| {
            tracing::warn!("Error decoding request body: {}", e);
            AppError::BadRequest(anyhow::anyhow!("Invalid request body: {}", e))
        })
    }
}

/// Absent fields decode as empty strings.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub completion: String,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct PromptQuery {
    pub file: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PromptUpdateRequest {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptUpdateResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub task_count: usize,
    pub cpu_usage: f64,
    pub cpu_count: usize,
    #[serde(rename = "memUsageMB")]
    pub mem_usage_mb: f64,
}
