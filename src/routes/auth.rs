use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::User;
use crate::routes::extract::JsonBody;
use crate::routes::validation::require_non_empty;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Create an account
///
/// Returns 409 Conflict if the username is taken (case-insensitive).
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state
        .users
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for a bearer session token
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    require_non_empty(&payload.username, "username")?;
    require_non_empty(&payload.password, "password")?;

    let (token, user) = state
        .users
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(LoginResponse { token, user }))
}
