use async_trait::async_trait;
use chrono::Utc;

use crate::db::{self, get_record, index_values, tables, Db};
use crate::error::Result;
use crate::live::{LiveEvent, LiveHub};
use crate::models::{Notification, NotificationRecord};

/// Delivers a message to a user
///
/// Delivery is best-effort: callers log a failed notify and carry on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: u64, message: &str, route: Option<&str>) -> Result<()>;
}

/// Persists notifications and pushes them to the user's live sessions
pub struct NotificationService {
    db: Db,
    hub: LiveHub,
}

impl NotificationService {
    pub fn new(db: Db, hub: LiveHub) -> Self {
        Self { db, hub }
    }

    /// Store a notification, then push it to any connected session
    pub async fn create(
        &self,
        user_id: u64,
        message: String,
        route: Option<String>,
    ) -> Result<Notification> {
        let db = self.db.clone();

        let notification = tokio::task::spawn_blocking(move || -> Result<Notification> {
            let record = NotificationRecord {
                user_id,
                message,
                route,
                dismissed: false,
                created_at: Utc::now().timestamp(),
            };

            let write_txn = db.begin_write()?;
            let id = db::next_id(&write_txn, "notifications")?;
            {
                let mut notifications = write_txn.open_table(tables::NOTIFICATIONS)?;
                let bytes = db::encode(&record)?;
                notifications.insert(id, bytes.as_slice())?;

                let mut index = write_txn.open_multimap_table(tables::USER_NOTIFICATIONS)?;
                index.insert(user_id, id)?;
            }
            write_txn.commit()?;

            Ok(Notification::from_record(id, &record))
        })
        .await??;

        let sessions = self
            .hub
            .push(user_id, LiveEvent::Notification(notification.clone()));
        tracing::debug!(
            "Notification {} for user {} pushed to {} live session(s)",
            notification.id,
            user_id,
            sessions
        );

        Ok(notification)
    }

    /// Notifications of a user, newest first
    pub async fn list(&self, user_id: u64) -> Result<Vec<Notification>> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<Notification>> {
            let read_txn = db.begin_read()?;
            let index = read_txn.open_multimap_table(tables::USER_NOTIFICATIONS)?;
            let notifications = read_txn.open_table(tables::NOTIFICATIONS)?;

            let mut ids = index_values(&index, user_id)?;
            ids.sort_unstable_by(|a, b| b.cmp(a));

            let mut result = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(record) = get_record::<NotificationRecord, _>(&notifications, id)? {
                    result.push(Notification::from_record(id, &record));
                }
            }
            Ok(result)
        })
        .await?
    }

    /// Mark every notification of a user as dismissed; returns how many changed
    pub async fn dismiss_all(&self, user_id: u64) -> Result<usize> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<usize> {
            let write_txn = db.begin_write()?;
            let changed = {
                let index = write_txn.open_multimap_table(tables::USER_NOTIFICATIONS)?;
                let mut notifications = write_txn.open_table(tables::NOTIFICATIONS)?;

                let mut changed = 0;
                for id in index_values(&index, user_id)? {
                    let mut record: NotificationRecord = match get_record(&notifications, id)? {
                        Some(record) => record,
                        None => continue,
                    };
                    if record.dismissed {
                        continue;
                    }
                    record.dismissed = true;
                    let bytes = db::encode(&record)?;
                    notifications.insert(id, bytes.as_slice())?;
                    changed += 1;
                }
                changed
            };
            write_txn.commit()?;

            Ok(changed)
        })
        .await?
    }
}

#[async_trait]
impl Notifier for NotificationService {
    async fn notify(&self, user_id: u64, message: &str, route: Option<&str>) -> Result<()> {
        self.create(user_id, message.to_string(), route.map(str::to_string))
            .await?;
        Ok(())
    }
}
