use serde::{Deserialize, Serialize};

use crate::routes::timestamp_to_rfc3339;

/// Notification record stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub user_id: u64,
    pub message: String,
    /// Frontend route the notification links to
    pub route: Option<String>,
    pub dismissed: bool,
    pub created_at: i64,
}

/// Notification model for API responses and live pushes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub user_id: u64,
    pub message: String,
    pub route: Option<String>,
    pub dismissed: bool,
    pub created_at: String,
}

impl Notification {
    pub fn from_record(id: u64, record: &NotificationRecord) -> Self {
        Self {
            id,
            user_id: record.user_id,
            message: record.message.clone(),
            route: record.route.clone(),
            dismissed: record.dismissed,
            created_at: timestamp_to_rfc3339(record.created_at),
        }
    }
}
