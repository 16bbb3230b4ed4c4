use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::constants::{auto_collects_key, collections_key, user_stats_key, NOTIFY_ALL_USERS};
use crate::error::{AppError, Result};
use crate::models::{AutoCollectRule, Feedback, NewAutoCollectRule, User};
use crate::routes::extract::{AdminUser, JsonBody, ModeratorUser};
use crate::routes::friends::SuccessResponse;
use crate::routes::validation::{parse_id, require_non_empty};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BanRequest {
    pub id: u64,
    pub banned: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdminNotificationRequest {
    /// Target username, or `allOfThem` for every account
    pub username: String,
    pub message: String,
    pub route: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminNotificationResponse {
    pub sent: usize,
}

#[derive(Debug, Serialize)]
pub struct FriendAcceptResponse {
    pub accepted: usize,
}

/// Ban or unban a user (moderators and administrators)
pub async fn ban_user(
    State(state): State<AppState>,
    ModeratorUser(actor): ModeratorUser,
    JsonBody(payload): JsonBody<BanRequest>,
) -> Result<Json<User>> {
    if payload.id == actor.id {
        return Err(AppError::InvalidParameters(
            "You cannot ban yourself".to_string(),
        ));
    }

    let user = state.users.set_banned(payload.id, payload.banned).await?;
    tracing::info!(
        "User {} set banned={} on user {}",
        actor.id,
        payload.banned,
        payload.id
    );

    Ok(Json(user))
}

pub async fn list_users(
    State(state): State<AppState>,
    ModeratorUser(_actor): ModeratorUser,
) -> Result<Json<Vec<User>>> {
    let users = state.users.all_users().await?;
    Ok(Json(users))
}

pub async fn list_rules(
    State(state): State<AppState>,
    AdminUser(_actor): AdminUser,
) -> Result<Json<Vec<AutoCollectRule>>> {
    let rules = state.auto_collect.all_rules().await?;
    Ok(Json(rules))
}

pub async fn create_rule(
    State(state): State<AppState>,
    AdminUser(_actor): AdminUser,
    JsonBody(payload): JsonBody<NewAutoCollectRule>,
) -> Result<(StatusCode, Json<AutoCollectRule>)> {
    let rule = state.auto_collect.create_rule(payload).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// Send a notification to one user or to everyone
pub async fn send_notification(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    JsonBody(payload): JsonBody<AdminNotificationRequest>,
) -> Result<Json<AdminNotificationResponse>> {
    require_non_empty(&payload.message, "message")?;

    let recipients: Vec<u64> = if payload.username == NOTIFY_ALL_USERS {
        state
            .users
            .all_users()
            .await?
            .into_iter()
            .map(|user| user.id)
            .collect()
    } else {
        vec![state.users.find_by_username(&payload.username).await?.id]
    };

    for user_id in &recipients {
        state
            .notifications
            .create(*user_id, payload.message.clone(), payload.route.clone())
            .await?;
    }

    tracing::info!(
        "Administrator {} sent a notification to {} user(s)",
        actor.id,
        recipients.len()
    );

    Ok(Json(AdminNotificationResponse {
        sent: recipients.len(),
    }))
}

/// Drop the cached lists and stats of a user
pub async fn purge_user_cache(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    let user_id = parse_id(&user_id)?;

    for key in [
        collections_key(user_id),
        auto_collects_key(user_id),
        user_stats_key(user_id),
    ] {
        state.cache.del(&key).await?;
    }

    tracing::info!("Administrator {} purged cache of user {}", actor.id, user_id);

    Ok(Json(SuccessResponse { success: true }))
}

/// Every feedback entry, newest first
pub async fn list_feedback(
    State(state): State<AppState>,
    AdminUser(_actor): AdminUser,
) -> Result<Json<Vec<Feedback>>> {
    let feedback = state.users.all_feedback().await?;
    Ok(Json(feedback))
}

/// Accept every pending friend request; development environments only
pub async fn dev_accept_friends(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
) -> Result<Json<FriendAcceptResponse>> {
    if !state.config.is_development() {
        tracing::warn!(
            "Administrator {} called a developer route outside development",
            actor.id
        );
        return Err(AppError::AdminOnly);
    }

    let accepted = state.relationships.accept_all_pending().await?;
    Ok(Json(FriendAcceptResponse { accepted }))
}
