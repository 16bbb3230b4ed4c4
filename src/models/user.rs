use serde::{Deserialize, Serialize};

use crate::constants::{MAX_USERNAME_LEN, MIN_USERNAME_LEN};
use crate::models::friend::status_or_false;
use crate::models::{FriendStatus, MutualCollection, MutualFriend};
use crate::routes::timestamp_to_rfc3339;

/// User record stored in redb
/// Uses Unix timestamps for compact storage with bincode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    /// bcrypt hash
    pub password_hash: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub administrator: bool,
    pub moderator: bool,
    pub banned: bool,
    pub dark_theme: bool,
    pub discord_precache: bool,
    pub items_per_page: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Full account view returned to the account owner and administrators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub administrator: bool,
    pub moderator: bool,
    pub banned: bool,
    pub dark_theme: bool,
    pub discord_precache: bool,
    pub items_per_page: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn from_record(id: u64, record: &UserRecord) -> Self {
        Self {
            id,
            username: record.username.clone(),
            email: record.email.clone(),
            description: record.description.clone(),
            avatar: record.avatar.clone(),
            banner: record.banner.clone(),
            administrator: record.administrator,
            moderator: record.moderator,
            banned: record.banned,
            dark_theme: record.dark_theme,
            discord_precache: record.discord_precache,
            items_per_page: record.items_per_page,
            created_at: timestamp_to_rfc3339(record.created_at),
            updated_at: timestamp_to_rfc3339(record.updated_at),
        }
    }

    /// Validate a username: 2-32 chars of `[A-Za-z0-9_.-]`
    pub fn validate_username(username: &str) -> bool {
        (MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&username.len())
            && username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    }
}

/// Public subset of a user shown to other users
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    pub avatar: Option<String>,
    pub description: Option<String>,
    pub administrator: bool,
    pub moderator: bool,
}

impl UserSummary {
    pub fn from_record(id: u64, record: &UserRecord) -> Self {
        Self {
            id,
            username: record.username.clone(),
            avatar: record.avatar.clone(),
            description: record.description.clone(),
            administrator: record.administrator,
            moderator: record.moderator,
        }
    }
}

/// Profile page of a user as seen by another (signed-in) user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub administrator: bool,
    pub moderator: bool,
    pub created_at: String,
    /// Collections both users appear in
    pub collections: Vec<MutualCollection>,
    /// Viewer's relationship status towards this user
    #[serde(serialize_with = "status_or_false")]
    pub friend: Option<FriendStatus>,
    /// This user's friends who are also friends with the viewer
    pub friends: Vec<MutualFriend>,
    pub stats: Option<serde_json::Value>,
}

/// Fields a user may change on their own account
///
/// Anything not named here is ignored when the request body is parsed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub current_password: Option<String>,
    pub discord_precache: Option<bool>,
    pub dark_theme: Option<bool>,
    pub description: Option<String>,
    pub items_per_page: Option<u32>,
}

impl UserUpdate {
    /// Treat empty strings as absent, and drop credential fields unless
    /// the current password was supplied
    pub fn normalized(mut self) -> Self {
        fn non_empty(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        self.username = non_empty(self.username);
        self.email = non_empty(self.email);
        self.password = non_empty(self.password);
        self.current_password = non_empty(self.current_password);
        self.description = non_empty(self.description);

        if self.current_password.is_none() {
            self.password = None;
            self.username = None;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(User::validate_username("alice"));
        assert!(User::validate_username("a.b-c_d"));

        // Too short
        assert!(!User::validate_username("a"));

        // Too long
        assert!(!User::validate_username(&"a".repeat(33)));

        // Invalid characters
        assert!(!User::validate_username("alice bob"));
        assert!(!User::validate_username("alice/../"));
    }

    #[test]
    fn test_update_ignores_unknown_fields() {
        let update: UserUpdate = serde_json::from_str(
            r#"{"description":"hi","administrator":true,"banned":false,"itemsPerPage":12}"#,
        )
        .unwrap();

        assert_eq!(update.description.as_deref(), Some("hi"));
        assert_eq!(update.items_per_page, Some(12));
    }

    #[test]
    fn test_update_drops_credentials_without_current_password() {
        let update = UserUpdate {
            username: Some("mallory".into()),
            password: Some("hunter2".into()),
            email: Some("m@example.com".into()),
            ..Default::default()
        }
        .normalized();

        assert!(update.username.is_none());
        assert!(update.password.is_none());
        assert_eq!(update.email.as_deref(), Some("m@example.com"));
    }

    #[test]
    fn test_update_keeps_credentials_with_current_password() {
        let update = UserUpdate {
            username: Some("alice2".into()),
            password: Some("new-password".into()),
            current_password: Some("old-password".into()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(update.username.as_deref(), Some("alice2"));
        assert_eq!(update.password.as_deref(), Some("new-password"));
    }

    #[test]
    fn test_update_treats_empty_strings_as_absent() {
        let update = UserUpdate {
            email: Some(String::new()),
            description: Some(String::new()),
            current_password: Some(String::new()),
            password: Some("x".into()),
            ..Default::default()
        }
        .normalized();

        assert!(update.email.is_none());
        assert!(update.description.is_none());
        assert!(update.current_password.is_none());
        assert!(update.password.is_none());
    }
}
