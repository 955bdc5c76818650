//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use super::AppState;
use crate::errors::AppError;

/// GET /healthz — process is up.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// GET /readyz — the database answers.
pub async fn readyz(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&*state.pool)
        .await
        .map_err(|err| AppError::internal(format!("database not ready: {err}")))?;
    Ok((StatusCode::OK, "ready"))
}
