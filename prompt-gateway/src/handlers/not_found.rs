use axum::http::Uri;
use service_core::error::AppError;

pub async fn not_found(uri: Uri) -> AppError {
    tracing::warn!(path = %uri.path(), "404 Not Found: {}", uri.path());
    AppError::NotFound(anyhow::anyhow!("404 page not found"))
}
