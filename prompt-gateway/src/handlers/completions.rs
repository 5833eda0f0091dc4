use crate::dtos::{GenerateRequest, GenerateResponse, JsonBody, SummaryRequest, SummaryResponse};
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

pub async fn generate(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let response = state.orchestrator.generate(req).await?;
    Ok(Json(response))
}

pub async fn summarize(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SummaryRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    let response = state.orchestrator.summarize(req).await?;
    Ok(Json(response))
}
