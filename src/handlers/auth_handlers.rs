//! Registration, login, and the current-user endpoint.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::UserDto;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .users
        .register(&req.username, &req.email, &req.password)
        .await?;
    let token = state.jwt.create_token(user.id, &user.username)?;
    Ok(Json(AuthResponse { token, user }))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .users
        .authenticate(&req.username_or_email, &req.password)
        .await?;
    let token = state.jwt.create_token(user.id, &user.username)?;
    Ok(Json(AuthResponse { token, user }))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserDto>, AppError> {
    let user = state.users.get_by_id(auth.user_id()).await?;
    Ok(Json(user))
}
