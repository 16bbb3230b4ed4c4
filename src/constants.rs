/// Cooldown before another friend request notification may be sent
/// for the same pair (30 minutes)
pub const FRIEND_NOTIFICATION_TTL_SECS: u64 = 1800;

/// Length of a session token in bytes before hex encoding
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Live push channel capacity; slow receivers skip older events
pub const LIVE_CHANNEL_CAPACITY: usize = 1024;

pub const MIN_USERNAME_LEN: usize = 2;
pub const MAX_USERNAME_LEN: usize = 32;

/// Upper bound for the gallery page size a user may choose
pub const MAX_ITEMS_PER_PAGE: u32 = 72;

/// Default gallery page size for new accounts
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 24;

/// Highest star rating a feedback entry may carry
pub const MAX_STAR_RATING: u8 = 5;

/// Username accepted by the admin notification route to address every user
pub const NOTIFY_ALL_USERS: &str = "allOfThem";

// =============================================================================
// Cache Keys
// =============================================================================

/// Suppression key for friend request notifications sent by `user_id` to `friend_id`
pub fn friend_notification_key(friend_id: u64, user_id: u64) -> String {
    format!("friendNotification:{}:{}", friend_id, user_id)
}

/// Materialized list of pending auto-collect approvals
pub fn auto_collects_key(user_id: u64) -> String {
    format!("autoCollects:{}", user_id)
}

/// Materialized list of a user's collections
pub fn collections_key(user_id: u64) -> String {
    format!("collections:{}", user_id)
}

/// Opaque statistics snapshot shown on profiles
pub fn user_stats_key(user_id: u64) -> String {
    format!("userStats:{}", user_id)
}

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_INVALID_USERNAME: &str =
    "Username must be 2-32 characters of letters, numbers, '_', '.' or '-'";

pub const ERR_INVALID_ACTION: &str = "Action must be either 'approve' or 'deny'";

pub const ERR_INVALID_ITEMS_PER_PAGE: &str = "itemsPerPage must be between 1 and 72";

pub const ERR_EMPTY_NAME: &str = "Name must not be empty";

pub const ERR_INVALID_STAR_RATING: &str = "starRating must be between 0 and 5";

pub const ERR_EMPTY_FEEDBACK: &str = "feedbackText must not be empty";
