use crate::dtos::{JsonBody, PromptQuery, PromptUpdateRequest, PromptUpdateResponse};
use crate::services::PromptStoreError;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// Lists templates, or returns one as plain text when `file` is given.
pub async fn get_prompt(
    State(state): State<AppState>,
    Query(query): Query<PromptQuery>,
) -> Result<Response, AppError> {
    match query.file.filter(|name| !name.is_empty()) {
        Some(name) => {
            let content = state.prompts.get(&name).await.map_err(|e| match e {
                PromptStoreError::NotFound(_) => {
                    AppError::NotFound(anyhow::anyhow!("File not found"))
                }
                other => AppError::from(other),
            })?;
            Ok(([(header::CONTENT_TYPE, "text/plain")], content).into_response())
        }
        None => {
            let names = state.prompts.list().await.map_err(|e| {
                tracing::error!("Error reading prompt directory: {}", e);
                AppError::InternalError(anyhow::anyhow!("Error reading directory: {}", e))
            })?;
            Ok(Json(names).into_response())
        }
    }
}

pub async fn update_prompt(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PromptUpdateRequest>,
) -> Result<Json<PromptUpdateResponse>, AppError> {
    req.validate()?;

    state
        .prompts
        .set(&req.filename, &req.prompt)
        .await
        .map_err(|e| {
            tracing::error!("Error writing to prompt file: {}", e);
            AppError::from(e)
        })?;

    Ok(Json(PromptUpdateResponse {
        status: "success".to_string(),
        message: format!("Prompt file {} updated successfully", req.filename),
    }))
}
