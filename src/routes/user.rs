use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::Result;
use crate::models::{Feedback, NewFeedback, User, UserProfile, UserUpdate};
use crate::routes::extract::{AuthUser, JsonBody};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BannerRequest {
    #[serde(default)]
    pub banner: String,
}

/// Current account
pub async fn current_user(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

/// Apply an allow-listed update to the current account
///
/// Unknown fields in the body are ignored.
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(update): JsonBody<UserUpdate>,
) -> Result<Json<User>> {
    let updated = state.users.update(user.id, update).await?;
    Ok(Json(updated))
}

/// An empty banner clears it
pub async fn update_banner(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<BannerRequest>,
) -> Result<Json<User>> {
    let updated = state.users.update_banner(user.id, payload.banner).await?;
    Ok(Json(updated))
}

pub async fn send_feedback(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(feedback): JsonBody<NewFeedback>,
) -> Result<(StatusCode, Json<Feedback>)> {
    let created = state.users.send_feedback(user.id, feedback).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn profile(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>> {
    let profile = state.users.profile(&username, viewer.id).await?;
    Ok(Json(profile))
}
