//! Friend relationships
//!
//! A relationship is stored once per unordered pair of users (see
//! [`FriendshipRecord`]); each side's `outgoing`/`incoming`/`accepted` status
//! is derived from it, so the two sides can never disagree. Every transition
//! reads and writes the pair inside a single redb write transaction, and redb
//! admits one writer at a time, so concurrent requests on a pair are
//! serialized.

use std::sync::Arc;

use chrono::Utc;
use redb::{ReadableTable, WriteTransaction};

use crate::cache::Cache;
use crate::constants::friend_notification_key;
use crate::db::{self, get_record, index_values, tables, Db};
use crate::error::{AppError, Result};
use crate::models::friend::pair_key;
use crate::models::{
    FriendEntry, FriendStatus, FriendshipRecord, MutualFriend, Transition, UserRecord,
    UserSummary,
};
use crate::services::Notifier;

pub struct RelationshipManager {
    db: Db,
    cache: Arc<dyn Cache>,
    notifier: Arc<dyn Notifier>,
    notification_ttl_secs: u64,
}

impl RelationshipManager {
    pub fn new(
        db: Db,
        cache: Arc<dyn Cache>,
        notifier: Arc<dyn Notifier>,
        notification_ttl_secs: u64,
    ) -> Self {
        Self {
            db,
            cache,
            notifier,
            notification_ttl_secs,
        }
    }

    /// Advance the relationship from `user_id` towards `friend_id`
    ///
    /// | caller's status | effect                                   |
    /// |-----------------|------------------------------------------|
    /// | none            | send a request, notify `friend_id`       |
    /// | outgoing        | withdraw the request                     |
    /// | incoming        | accept, notify the requester             |
    /// | accepted        | unfriend                                 |
    ///
    /// Returns the caller's status afterwards.
    pub async fn request_or_respond(
        &self,
        user_id: u64,
        friend_id: u64,
    ) -> Result<Option<FriendStatus>> {
        if user_id == friend_id {
            return Err(AppError::CannotFriendSelf);
        }

        let db = self.db.clone();

        let (transition, username) =
            tokio::task::spawn_blocking(move || -> Result<(Transition, String)> {
                let now = Utc::now().timestamp();

                let write_txn = db.begin_write()?;
                let (user, current) = {
                    let users = write_txn.open_table(tables::USERS)?;
                    let user: UserRecord = match get_record(&users, user_id)? {
                        Some(user) => user,
                        None => {
                            tracing::warn!("Friend request from non-existent user {}", user_id);
                            return Err(AppError::UserNotFound);
                        }
                    };
                    if users.get(friend_id)?.is_none() {
                        return Err(AppError::UserNotFound);
                    }

                    let friendships = write_txn.open_table(tables::FRIENDSHIPS)?;
                    let current = match friendships.get(pair_key(user_id, friend_id))? {
                        Some(bytes) => Some(db::decode::<FriendshipRecord>(bytes.value())?),
                        None => None,
                    };
                    (user, current)
                };

                let transition = Transition::from_status(
                    current.as_ref().map(|record| record.status_for(user_id)),
                );

                match transition {
                    Transition::Request => {
                        let record = FriendshipRecord::requested_by(user_id, now);
                        store_pair(&write_txn, user_id, friend_id, &record)?;
                    }
                    Transition::Accept => {
                        let mut record = current.ok_or(AppError::NotFound)?;
                        record.accepted = true;
                        record.updated_at = now;
                        store_pair(&write_txn, user_id, friend_id, &record)?;
                    }
                    Transition::Withdraw | Transition::Unfriend => {
                        destroy_pair(&write_txn, user_id, friend_id)?;
                    }
                }
                write_txn.commit()?;

                Ok((transition, user.username))
            })
            .await??;

        tracing::info!(
            "Friendship {} -> {}: {:?}",
            user_id,
            friend_id,
            transition
        );

        match transition {
            Transition::Request => self.notify_request(user_id, friend_id, &username).await,
            Transition::Accept => {
                self.send(
                    friend_id,
                    format!("{} has accepted your friend request!", username),
                    format!("/u/{}", username),
                )
                .await
            }
            Transition::Withdraw | Transition::Unfriend => {}
        }

        Ok(transition.resulting_status())
    }

    /// Remove the relationship between two users, whatever its status
    ///
    /// Removing a relationship that does not exist is a no-op.
    pub async fn remove_friend(&self, user_id: u64, friend_id: u64) -> Result<()> {
        let db = self.db.clone();

        let removed = tokio::task::spawn_blocking(move || -> Result<bool> {
            let write_txn = db.begin_write()?;
            let removed = destroy_pair(&write_txn, user_id, friend_id)?;
            write_txn.commit()?;
            Ok(removed)
        })
        .await??;

        if removed {
            tracing::info!("Friendship {} -> {} removed", user_id, friend_id);
        }

        Ok(())
    }

    /// Status of the relationship as seen by `user_id`; read-only
    pub async fn get_friend_status(
        &self,
        user_id: u64,
        other_user_id: u64,
    ) -> Result<Option<FriendStatus>> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<Option<FriendStatus>> {
            let read_txn = db.begin_read()?;
            let friendships = read_txn.open_table(tables::FRIENDSHIPS)?;

            let status = match friendships.get(pair_key(user_id, other_user_id))? {
                Some(bytes) => {
                    Some(db::decode::<FriendshipRecord>(bytes.value())?.status_for(user_id))
                }
                None => None,
            };
            Ok(status)
        })
        .await?
    }

    /// Every relationship of a user, with the counterpart's profile
    pub async fn list_friends(&self, user_id: u64) -> Result<Vec<FriendEntry>> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<FriendEntry>> {
            let read_txn = db.begin_read()?;
            let index = read_txn.open_multimap_table(tables::FRIEND_INDEX)?;
            let friendships = read_txn.open_table(tables::FRIENDSHIPS)?;
            let users = read_txn.open_table(tables::USERS)?;

            let mut entries = Vec::new();
            for friend_id in index_values(&index, user_id)? {
                let record = match friendships.get(pair_key(user_id, friend_id))? {
                    Some(bytes) => db::decode::<FriendshipRecord>(bytes.value())?,
                    None => continue,
                };
                let Some(friend) = get_record::<UserRecord, _>(&users, friend_id)? else {
                    continue;
                };
                entries.push(FriendEntry {
                    friend_id,
                    status: record.status_for(user_id),
                    user: UserSummary::from_record(friend_id, &friend),
                });
            }
            Ok(entries)
        })
        .await?
    }

    /// Friends of `user_id` who are also friends with `other_user_id`
    ///
    /// Returns the accepted rows `friend -> other_user_id` for every accepted
    /// friend of `user_id`, carrying the friend's profile.
    pub async fn mutual_friends(
        &self,
        user_id: u64,
        other_user_id: u64,
    ) -> Result<Vec<MutualFriend>> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<MutualFriend>> {
            let read_txn = db.begin_read()?;
            let index = read_txn.open_multimap_table(tables::FRIEND_INDEX)?;
            let friendships = read_txn.open_table(tables::FRIENDSHIPS)?;
            let users = read_txn.open_table(tables::USERS)?;

            let is_accepted = |a: u64, b: u64| -> Result<bool> {
                Ok(match friendships.get(pair_key(a, b))? {
                    Some(bytes) => db::decode::<FriendshipRecord>(bytes.value())?.accepted,
                    None => false,
                })
            };

            let mut mutual = Vec::new();
            for friend_id in index_values(&index, user_id)? {
                if friend_id == other_user_id || !is_accepted(user_id, friend_id)? {
                    continue;
                }
                if !is_accepted(friend_id, other_user_id)? {
                    continue;
                }
                if let Some(friend) = get_record::<UserRecord, _>(&users, friend_id)? {
                    mutual.push(MutualFriend {
                        user_id: friend_id,
                        friend_id: other_user_id,
                        user: UserSummary::from_record(friend_id, &friend),
                    });
                }
            }
            Ok(mutual)
        })
        .await?
    }

    /// Accept every pending request on the instance; returns how many
    pub async fn accept_all_pending(&self) -> Result<usize> {
        let db = self.db.clone();

        let accepted = tokio::task::spawn_blocking(move || -> Result<usize> {
            let now = Utc::now().timestamp();

            let write_txn = db.begin_write()?;
            let accepted = {
                let mut friendships = write_txn.open_table(tables::FRIENDSHIPS)?;

                let mut pending = Vec::new();
                for entry in friendships.iter()? {
                    let (key, value) = entry?;
                    let record: FriendshipRecord = db::decode(value.value())?;
                    if !record.accepted {
                        pending.push((key.value(), record));
                    }
                }

                let count = pending.len();
                for (key, mut record) in pending {
                    record.accepted = true;
                    record.updated_at = now;
                    let bytes = db::encode(&record)?;
                    friendships.insert(key, bytes.as_slice())?;
                }
                count
            };
            write_txn.commit()?;

            Ok(accepted)
        })
        .await??;

        tracing::info!("Accepted {} pending friend requests", accepted);

        Ok(accepted)
    }

    /// Notify `friend_id` of a new request unless one was sent recently
    async fn notify_request(&self, user_id: u64, friend_id: u64, username: &str) {
        let key = friend_notification_key(friend_id, user_id);

        let suppressed = match self.cache.get(&key).await {
            Ok(value) => value.is_some(),
            Err(e) => {
                tracing::warn!("Suppression lookup failed for {}: {}", key, e);
                false
            }
        };
        if suppressed {
            tracing::debug!("Friend request notification suppressed: {}", key);
            return;
        }

        if let Err(e) = self
            .cache
            .set_ex(&key, "true", self.notification_ttl_secs)
            .await
        {
            tracing::warn!("Failed to set suppression key {}: {}", key, e);
        }

        self.send(
            friend_id,
            format!("{} has sent you a friend request!", username),
            format!("/u/{}", username),
        )
        .await;
    }

    async fn send(&self, user_id: u64, message: String, route: String) {
        if let Err(e) = self.notifier.notify(user_id, &message, Some(&route)).await {
            tracing::error!("Failed to notify user {}: {:?}", user_id, e);
        }
    }
}

/// Write the pair record and make sure both users index it
fn store_pair(
    txn: &WriteTransaction,
    user_id: u64,
    friend_id: u64,
    record: &FriendshipRecord,
) -> Result<()> {
    let mut friendships = txn.open_table(tables::FRIENDSHIPS)?;
    let bytes = db::encode(record)?;
    friendships.insert(pair_key(user_id, friend_id), bytes.as_slice())?;

    let mut index = txn.open_multimap_table(tables::FRIEND_INDEX)?;
    index.insert(user_id, friend_id)?;
    index.insert(friend_id, user_id)?;
    Ok(())
}

/// Delete the pair record and both index entries; returns whether a record existed
fn destroy_pair(txn: &WriteTransaction, user_id: u64, friend_id: u64) -> Result<bool> {
    let removed = {
        let mut friendships = txn.open_table(tables::FRIENDSHIPS)?;
        let removed = friendships.remove(pair_key(user_id, friend_id))?.is_some();
        removed
    };

    let mut index = txn.open_multimap_table(tables::FRIEND_INDEX)?;
    index.remove(user_id, friend_id)?;
    index.remove(friend_id, user_id)?;
    Ok(removed)
}
