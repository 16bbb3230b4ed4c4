use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint
///
/// Reports database and cache connectivity. Used by load balancers and
/// monitoring systems.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    // Check database connectivity by attempting a read transaction
    let db = state.db.clone();
    let db_status = tokio::task::spawn_blocking(move || match db.begin_read() {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            "disconnected"
        }
    })
    .await
    .unwrap_or("error");

    let cache_status = match state.cache.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::error!("Cache health check failed: {:?}", e);
            "disconnected"
        }
    };

    let healthy = db_status == "connected" && cache_status == "connected";

    Json(json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "database": db_status,
        "cache": cache_status,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
