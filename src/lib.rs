//! TPU Server Library
//!
//! Core types and services of the user-relationship and auto-collect backend,
//! exported for the binary and the integration tests.

pub mod cache;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod live;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;

pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};

use std::sync::Arc;

use cache::Cache;
use live::LiveHub;
use services::{
    AutoCollectWorkflow, CollectionService, NotificationService, RelationshipManager, UserService,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub cache: Arc<dyn Cache>,
    pub hub: LiveHub,
    pub notifications: Arc<NotificationService>,
    pub relationships: Arc<RelationshipManager>,
    pub auto_collect: Arc<AutoCollectWorkflow>,
    pub collections: Arc<CollectionService>,
    pub users: Arc<UserService>,
}

impl AppState {
    /// Wire every service over the given database, configuration and cache
    pub fn new(db: Db, config: Config, cache: Arc<dyn Cache>) -> Self {
        let hub = LiveHub::new();
        let notifications = Arc::new(NotificationService::new(db.clone(), hub.clone()));
        let relationships = Arc::new(RelationshipManager::new(
            db.clone(),
            cache.clone(),
            notifications.clone(),
            config.friend_notification_ttl_secs,
        ));
        let auto_collect = Arc::new(AutoCollectWorkflow::new(db.clone(), cache.clone()));
        let collections = Arc::new(CollectionService::new(db.clone()));
        let users = Arc::new(UserService::new(
            db.clone(),
            cache.clone(),
            relationships.clone(),
            config.clone(),
        ));

        Self {
            db,
            config,
            cache,
            hub,
            notifications,
            relationships,
            auto_collect,
            collections,
            users,
        }
    }
}
