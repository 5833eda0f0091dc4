use crate::dtos::HealthSnapshot;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthSnapshot>, AppError> {
    let reporter = state.health.clone();
    // sysinfo reads /proc synchronously.
    let snapshot = tokio::task::spawn_blocking(move || reporter.snapshot())
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Health sampling failed: {}", e)))?;

    tracing::debug!(task_count = snapshot.task_count, "Health check");
    Ok(Json(snapshot))
}
