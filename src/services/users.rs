use std::sync::Arc;

use chrono::Utc;
use redb::ReadableTable;

use crate::cache::Cache;
use crate::config::Config;
use crate::constants::{
    collections_key, user_stats_key, DEFAULT_ITEMS_PER_PAGE, ERR_EMPTY_FEEDBACK,
    ERR_INVALID_ITEMS_PER_PAGE, ERR_INVALID_STAR_RATING, ERR_INVALID_USERNAME,
    MAX_ITEMS_PER_PAGE,
};
use crate::db::{self, get_record, tables, Db};
use crate::error::{AppError, Result};
use crate::models::collection::mutual_collections;
use crate::models::{
    CollectionCache, Feedback, FeedbackRecord, NewFeedback, User, UserProfile, UserRecord,
    UserUpdate,
};
use crate::security::{generate_session_token, hash_password, session_digest, verify_password};
use crate::services::RelationshipManager;

/// Accounts, sessions and profiles
pub struct UserService {
    db: Db,
    cache: Arc<dyn Cache>,
    relationships: Arc<RelationshipManager>,
    config: Config,
}

impl UserService {
    pub fn new(
        db: Db,
        cache: Arc<dyn Cache>,
        relationships: Arc<RelationshipManager>,
        config: Config,
    ) -> Self {
        Self {
            db,
            cache,
            relationships,
            config,
        }
    }

    /// Create an account
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        if !User::validate_username(username) {
            return Err(AppError::InvalidParameters(ERR_INVALID_USERNAME.to_string()));
        }
        if !email.contains('@') {
            return Err(AppError::InvalidParameters("Invalid email address".to_string()));
        }
        if password.is_empty() {
            return Err(AppError::InvalidParameters("Password must not be empty".to_string()));
        }

        let administrator = self
            .config
            .admin_username
            .as_deref()
            .is_some_and(|admin| admin.eq_ignore_ascii_case(username));

        let db = self.db.clone();
        let cost = self.config.bcrypt_cost;
        let username = username.to_string();
        let email = email.to_string();
        let password = password.to_string();

        let user = tokio::task::spawn_blocking(move || -> Result<User> {
            let password_hash = hash_password(&password, cost)?;
            let now = Utc::now().timestamp();
            let lookup = username.to_lowercase();

            let write_txn = db.begin_write()?;
            {
                let usernames = write_txn.open_table(tables::USERNAMES)?;
                if usernames.get(lookup.as_str())?.is_some() {
                    tracing::info!("Registration with taken username: {}", username);
                    return Err(AppError::UsernameTaken);
                }
            }

            let id = db::next_id(&write_txn, "users")?;
            let record = UserRecord {
                username,
                email,
                password_hash,
                description: None,
                avatar: None,
                banner: None,
                administrator,
                moderator: false,
                banned: false,
                dark_theme: true,
                discord_precache: false,
                items_per_page: DEFAULT_ITEMS_PER_PAGE,
                created_at: now,
                updated_at: now,
            };
            {
                let mut users = write_txn.open_table(tables::USERS)?;
                let bytes = db::encode(&record)?;
                users.insert(id, bytes.as_slice())?;

                let mut usernames = write_txn.open_table(tables::USERNAMES)?;
                usernames.insert(lookup.as_str(), id)?;
            }
            write_txn.commit()?;

            Ok(User::from_record(id, &record))
        })
        .await??;

        tracing::info!("New user registered: {} ({})", user.username, user.id);

        Ok(user)
    }

    /// Verify credentials and open a session; returns the bearer token
    pub async fn login(&self, username: &str, password: &str) -> Result<(String, User)> {
        let db = self.db.clone();
        let secret = self.config.session_secret.clone();
        let lookup = username.to_lowercase();
        let password = password.to_string();

        let (token, user) = tokio::task::spawn_blocking(move || -> Result<(String, User)> {
            let (id, record) = {
                let read_txn = db.begin_read()?;
                let usernames = read_txn.open_table(tables::USERNAMES)?;
                let users = read_txn.open_table(tables::USERS)?;

                let id = match usernames.get(lookup.as_str())? {
                    Some(id) => id.value(),
                    None => return Err(AppError::InvalidCredentials),
                };
                let record: UserRecord =
                    get_record(&users, id)?.ok_or(AppError::InvalidCredentials)?;
                (id, record)
            };

            if !verify_password(&password, &record.password_hash)? {
                tracing::warn!("Failed login for user {}", id);
                return Err(AppError::InvalidCredentials);
            }
            if record.banned {
                return Err(AppError::Banned);
            }

            let token = generate_session_token();
            let digest = session_digest(&token, &secret)?;

            let write_txn = db.begin_write()?;
            {
                let mut sessions = write_txn.open_table(tables::SESSIONS)?;
                sessions.insert(digest.as_str(), id)?;
            }
            write_txn.commit()?;

            Ok((token, User::from_record(id, &record)))
        })
        .await??;

        tracing::info!("User {} logged in", user.id);

        Ok((token, user))
    }

    /// Resolve a bearer token to its user
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let db = self.db.clone();
        let digest = session_digest(token, &self.config.session_secret)?;

        tokio::task::spawn_blocking(move || -> Result<User> {
            let read_txn = db.begin_read()?;
            let sessions = read_txn.open_table(tables::SESSIONS)?;
            let users = read_txn.open_table(tables::USERS)?;

            let id = match sessions.get(digest.as_str())? {
                Some(id) => id.value(),
                None => return Err(AppError::InvalidToken),
            };
            let record: UserRecord = get_record(&users, id)?.ok_or(AppError::InvalidToken)?;
            if record.banned {
                return Err(AppError::Banned);
            }

            Ok(User::from_record(id, &record))
        })
        .await?
    }

    pub async fn get(&self, user_id: u64) -> Result<User> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<User> {
            let read_txn = db.begin_read()?;
            let users = read_txn.open_table(tables::USERS)?;
            let record: UserRecord = get_record(&users, user_id)?.ok_or(AppError::UserNotFound)?;
            Ok(User::from_record(user_id, &record))
        })
        .await?
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User> {
        let db = self.db.clone();
        let lookup = username.to_lowercase();

        tokio::task::spawn_blocking(move || -> Result<User> {
            let read_txn = db.begin_read()?;
            let usernames = read_txn.open_table(tables::USERNAMES)?;
            let users = read_txn.open_table(tables::USERS)?;

            let id = match usernames.get(lookup.as_str())? {
                Some(id) => id.value(),
                None => return Err(AppError::UserNotFound),
            };
            let record: UserRecord = get_record(&users, id)?.ok_or(AppError::UserNotFound)?;
            Ok(User::from_record(id, &record))
        })
        .await?
    }

    /// Every account, newest first
    pub async fn all_users(&self) -> Result<Vec<User>> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<User>> {
            let read_txn = db.begin_read()?;
            let users = read_txn.open_table(tables::USERS)?;

            let mut result = Vec::new();
            for entry in users.iter()? {
                let (id, value) = entry?;
                let record: UserRecord = db::decode(value.value())?;
                result.push(User::from_record(id.value(), &record));
            }
            result.reverse();
            Ok(result)
        })
        .await?
    }

    /// Apply an allow-listed update to the user's own account
    ///
    /// `username` and `password` only change when `current_password` is
    /// supplied and verifies.
    pub async fn update(&self, user_id: u64, update: UserUpdate) -> Result<User> {
        let update = update.normalized();

        if let Some(username) = &update.username {
            if !User::validate_username(username) {
                return Err(AppError::InvalidParameters(ERR_INVALID_USERNAME.to_string()));
            }
        }
        if let Some(items_per_page) = update.items_per_page {
            if !(1..=MAX_ITEMS_PER_PAGE).contains(&items_per_page) {
                return Err(AppError::InvalidParameters(
                    ERR_INVALID_ITEMS_PER_PAGE.to_string(),
                ));
            }
        }

        let db = self.db.clone();
        let cost = self.config.bcrypt_cost;

        let user = tokio::task::spawn_blocking(move || -> Result<User> {
            // Hash outside the write transaction; bcrypt is slow
            let new_password_hash = match (&update.current_password, &update.password) {
                (Some(_), Some(password)) => Some(hash_password(password, cost)?),
                _ => None,
            };

            let write_txn = db.begin_write()?;
            let record = {
                let mut users = write_txn.open_table(tables::USERS)?;
                let mut usernames = write_txn.open_table(tables::USERNAMES)?;
                let mut record: UserRecord =
                    get_record(&users, user_id)?.ok_or(AppError::UserNotFound)?;

                // Checked against the hash this transaction will overwrite
                if let Some(current_password) = &update.current_password {
                    if !verify_password(current_password, &record.password_hash)? {
                        tracing::warn!("Invalid current password on update for user {}", user_id);
                        return Err(AppError::InvalidCredentials);
                    }
                }

                if let Some(username) = update.username {
                    let old_lookup = record.username.to_lowercase();
                    let new_lookup = username.to_lowercase();
                    if new_lookup != old_lookup {
                        let taken = usernames
                            .get(new_lookup.as_str())?
                            .map(|owner| owner.value());
                        if taken.is_some_and(|owner| owner != user_id) {
                            return Err(AppError::UsernameTaken);
                        }
                        usernames.remove(old_lookup.as_str())?;
                        usernames.insert(new_lookup.as_str(), user_id)?;
                    }
                    record.username = username;
                }
                if let Some(password_hash) = new_password_hash {
                    record.password_hash = password_hash;
                }
                if let Some(email) = update.email {
                    record.email = email;
                }
                if let Some(description) = update.description {
                    record.description = Some(description);
                }
                if let Some(dark_theme) = update.dark_theme {
                    record.dark_theme = dark_theme;
                }
                if let Some(discord_precache) = update.discord_precache {
                    record.discord_precache = discord_precache;
                }
                if let Some(items_per_page) = update.items_per_page {
                    record.items_per_page = items_per_page;
                }
                record.updated_at = Utc::now().timestamp();

                let bytes = db::encode(&record)?;
                users.insert(user_id, bytes.as_slice())?;
                record
            };
            write_txn.commit()?;

            Ok(User::from_record(user_id, &record))
        })
        .await??;

        tracing::info!("User {} updated their account", user_id);

        Ok(user)
    }

    /// Set or clear (empty string) the profile banner
    pub async fn update_banner(&self, user_id: u64, banner: String) -> Result<User> {
        let db = self.db.clone();
        let banner = Some(banner.trim().to_string()).filter(|b| !b.is_empty());

        let user = tokio::task::spawn_blocking(move || -> Result<User> {
            let write_txn = db.begin_write()?;
            let record = {
                let mut users = write_txn.open_table(tables::USERS)?;
                let mut record: UserRecord =
                    get_record(&users, user_id)?.ok_or(AppError::UserNotFound)?;
                record.banner = banner;
                record.updated_at = Utc::now().timestamp();
                let bytes = db::encode(&record)?;
                users.insert(user_id, bytes.as_slice())?;
                record
            };
            write_txn.commit()?;

            Ok(User::from_record(user_id, &record))
        })
        .await??;

        tracing::info!("User {} updated their banner", user_id);

        Ok(user)
    }

    /// Store a feedback entry from a user
    pub async fn send_feedback(&self, user_id: u64, feedback: NewFeedback) -> Result<Feedback> {
        let feedback_text = feedback.feedback_text.trim().to_string();
        if feedback_text.is_empty() {
            return Err(AppError::InvalidParameters(ERR_EMPTY_FEEDBACK.to_string()));
        }
        if !feedback.has_valid_rating() {
            return Err(AppError::InvalidParameters(ERR_INVALID_STAR_RATING.to_string()));
        }

        let db = self.db.clone();

        let created = tokio::task::spawn_blocking(move || -> Result<Feedback> {
            let record = FeedbackRecord {
                user_id,
                feedback_text,
                star_rating: feedback.star_rating,
                route: feedback.route,
                created_at: Utc::now().timestamp(),
            };

            let write_txn = db.begin_write()?;
            let id = db::next_id(&write_txn, "feedback")?;
            {
                let mut table = write_txn.open_table(tables::FEEDBACK)?;
                let bytes = db::encode(&record)?;
                table.insert(id, bytes.as_slice())?;
            }
            write_txn.commit()?;

            Ok(Feedback::from_record(id, &record))
        })
        .await??;

        tracing::info!("Feedback {} received from user {}", created.id, user_id);

        Ok(created)
    }

    /// Every feedback entry, newest first
    pub async fn all_feedback(&self) -> Result<Vec<Feedback>> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<Feedback>> {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(tables::FEEDBACK)?;

            let mut result = Vec::new();
            for entry in table.iter()? {
                let (id, value) = entry?;
                let record: FeedbackRecord = db::decode(value.value())?;
                result.push(Feedback::from_record(id.value(), &record));
            }
            result.reverse();
            Ok(result)
        })
        .await?
    }

    /// Ban or unban an account
    pub async fn set_banned(&self, user_id: u64, banned: bool) -> Result<User> {
        let db = self.db.clone();

        let user = tokio::task::spawn_blocking(move || -> Result<User> {
            let write_txn = db.begin_write()?;
            let record = {
                let mut users = write_txn.open_table(tables::USERS)?;
                let mut record: UserRecord =
                    get_record(&users, user_id)?.ok_or(AppError::UserNotFound)?;
                record.banned = banned;
                record.updated_at = Utc::now().timestamp();
                let bytes = db::encode(&record)?;
                users.insert(user_id, bytes.as_slice())?;
                record
            };
            write_txn.commit()?;

            Ok(User::from_record(user_id, &record))
        })
        .await??;

        tracing::info!("User {} banned: {}", user_id, banned);

        Ok(user)
    }

    /// Profile of `username` as seen by `viewer_id`
    pub async fn profile(&self, username: &str, viewer_id: u64) -> Result<UserProfile> {
        let user = self.find_by_username(username).await?;

        let collections = self.mutual_collections(viewer_id, user.id).await;
        let friend = self
            .relationships
            .get_friend_status(viewer_id, user.id)
            .await?;
        let friends = self.relationships.mutual_friends(user.id, viewer_id).await?;

        let stats = match self
            .cache
            .get_json::<serde_json::Value>(&user_stats_key(user.id))
            .await
        {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("Ignoring unusable stats for user {}: {}", user.id, e);
                None
            }
        };

        Ok(UserProfile {
            id: user.id,
            username: user.username,
            description: user.description,
            avatar: user.avatar,
            banner: user.banner,
            administrator: user.administrator,
            moderator: user.moderator,
            created_at: user.created_at,
            collections,
            friend,
            friends,
            stats,
        })
    }

    /// Collections in both users' cached lists; empty unless both are cached
    async fn mutual_collections(
        &self,
        user_id: u64,
        other_user_id: u64,
    ) -> Vec<crate::models::MutualCollection> {
        let mine = self.cached_collections(user_id).await;
        let theirs = self.cached_collections(other_user_id).await;

        match (mine, theirs) {
            (Some(mine), Some(theirs)) => mutual_collections(mine, &theirs),
            _ => Vec::new(),
        }
    }

    async fn cached_collections(&self, user_id: u64) -> Option<Vec<CollectionCache>> {
        match self
            .cache
            .get_json::<Vec<CollectionCache>>(&collections_key(user_id))
            .await
        {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Ignoring unusable collection cache for {}: {}", user_id, e);
                None
            }
        }
    }
}
