use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::Result;
use crate::models::Notification;
use crate::routes::extract::AuthUser;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DismissResponse {
    pub dismissed: usize,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Notification>>> {
    let notifications = state.notifications.list(user.id).await?;
    Ok(Json(notifications))
}

pub async fn dismiss_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<DismissResponse>> {
    let dismissed = state.notifications.dismiss_all(user.id).await?;
    Ok(Json(DismissResponse { dismissed }))
}
