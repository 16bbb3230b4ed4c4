use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::error::Result;
use crate::models::friend::status_or_false;
use crate::models::{FriendEntry, FriendStatus};
use crate::routes::extract::AuthUser;
use crate::routes::validation::parse_id;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FriendStatusResponse {
    /// Caller's status towards the other user, `false` when unrelated
    #[serde(serialize_with = "status_or_false")]
    pub status: Option<FriendStatus>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub async fn list_friends(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<FriendEntry>>> {
    let friends = state.relationships.list_friends(user.id).await?;
    Ok(Json(friends))
}

/// Send, withdraw, accept or unfriend depending on the current status
pub async fn request_or_respond(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(friend_id): Path<String>,
) -> Result<Json<FriendStatusResponse>> {
    let friend_id = parse_id(&friend_id)?;
    let status = state
        .relationships
        .request_or_respond(user.id, friend_id)
        .await?;

    Ok(Json(FriendStatusResponse { status }))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(friend_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    let friend_id = parse_id(&friend_id)?;
    state.relationships.remove_friend(user.id, friend_id).await?;

    Ok(Json(SuccessResponse { success: true }))
}
