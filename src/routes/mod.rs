pub mod admin;
pub mod auth;
pub mod auto_collect;
pub mod collections;
pub mod extract;
pub mod friends;
pub mod gateway;
pub mod health;
pub mod notifications;
pub mod user;
pub mod validation;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::AppState;

pub use extract::AuthUser;
pub use health::health_check;
pub use validation::timestamp_to_rfc3339;

/// Every route of the API, without transport layers
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/user", get(user::current_user).patch(user::update_user))
        .route("/user/banner", patch(user::update_banner))
        .route("/user/feedback", post(user::send_feedback))
        .route("/user/profile/:username", get(user::profile))
        .route("/user/friends", get(friends::list_friends))
        .route(
            "/user/friends/:id",
            post(friends::request_or_respond).delete(friends::remove_friend),
        )
        .route(
            "/notifications",
            get(notifications::list_notifications).patch(notifications::dismiss_notifications),
        )
        .route("/collections", post(collections::create_collection))
        .route("/collections/:id/items", get(collections::collection_items))
        .route("/autoCollects", get(auto_collect::list_pending))
        .route("/autoCollects/rules", get(auto_collect::my_rules))
        .route("/autoCollects/:id", patch(auto_collect::act))
        .route("/admin/ban", patch(admin::ban_user))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/feedback", get(admin::list_feedback))
        .route(
            "/admin/autoCollects",
            get(admin::list_rules).post(admin::create_rule),
        )
        .route("/admin/notification", post(admin::send_notification))
        .route("/admin/cache/user/:uid", delete(admin::purge_user_cache))
        .route("/admin/dev/friendAccept", patch(admin::dev_accept_friends))
        .route("/gateway", get(gateway::gateway));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v3", api)
        .with_state(state)
}
