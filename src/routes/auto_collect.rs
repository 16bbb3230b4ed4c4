use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::models::{AutoCollectRule, PendingApproval};
use crate::routes::extract::{AuthUser, JsonBody};
use crate::routes::friends::SuccessResponse;
use crate::routes::validation::{parse_id, ActionRequest};
use crate::AppState;

/// Pending approvals of the current user
pub async fn list_pending(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<PendingApproval>>> {
    let pending = state.auto_collect.list_pending(user.id).await?;
    Ok(Json(pending))
}

/// Approve or deny one pending approval
pub async fn act(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(approval_id): Path<String>,
    JsonBody(payload): JsonBody<ActionRequest>,
) -> Result<Json<SuccessResponse>> {
    let approval_id = parse_id(&approval_id)?;
    let approval = state.auto_collect.find(user.id, approval_id).await?;
    let success = state
        .auto_collect
        .act(user.id, &approval, &payload.action)
        .await?;

    Ok(Json(SuccessResponse { success }))
}

pub async fn my_rules(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<AutoCollectRule>>> {
    let rules = state.auto_collect.rules_for_user(user.id).await?;
    Ok(Json(rules))
}
