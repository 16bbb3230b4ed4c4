use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::Result;
use crate::models::{Collection, CollectionItem};
use crate::routes::extract::{AuthUser, JsonBody};
use crate::routes::validation::parse_id;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    pub image: Option<String>,
}

pub async fn create_collection(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<CreateCollectionRequest>,
) -> Result<(StatusCode, Json<Collection>)> {
    let collection = state
        .collections
        .create(user.id, payload.name, payload.image)
        .await?;

    Ok((StatusCode::CREATED, Json(collection)))
}

pub async fn collection_items(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(collection_id): Path<String>,
) -> Result<Json<Vec<CollectionItem>>> {
    let collection_id = parse_id(&collection_id)?;
    let items = state.collections.items(user.id, collection_id).await?;
    Ok(Json(items))
}
