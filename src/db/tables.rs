use redb::{MultimapTableDefinition, TableDefinition};

/// Users table: user_id -> UserRecord (serialized)
pub const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Username index: lowercase username -> user_id
pub const USERNAMES: TableDefinition<&str, u64> = TableDefinition::new("usernames");

/// Sessions table: HMAC digest of the bearer token -> user_id
pub const SESSIONS: TableDefinition<&str, u64> = TableDefinition::new("sessions");

/// Friendships table: (lower user_id, higher user_id) -> FriendshipRecord (serialized)
/// One record per unordered pair; directional status is derived on read
pub const FRIENDSHIPS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("friendships");

/// Friend index: user_id -> counterpart user_id, one entry per direction
pub const FRIEND_INDEX: MultimapTableDefinition<u64, u64> =
    MultimapTableDefinition::new("friend_index");

/// Notifications table: notification_id -> NotificationRecord (serialized)
pub const NOTIFICATIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("notifications");

/// User notifications index: user_id -> notification_id
pub const USER_NOTIFICATIONS: MultimapTableDefinition<u64, u64> =
    MultimapTableDefinition::new("user_notifications");

/// Collections table: collection_id -> CollectionRecord (serialized)
pub const COLLECTIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("collections");

/// Collection items table: item_id -> CollectionItemRecord (serialized)
pub const COLLECTION_ITEMS: TableDefinition<u64, &[u8]> = TableDefinition::new("collection_items");

/// Collection items index: collection_id -> item_id
pub const COLLECTION_ITEM_INDEX: MultimapTableDefinition<u64, u64> =
    MultimapTableDefinition::new("collection_item_index");

/// Pending auto-collect approvals: approval_id -> AutoCollectApprovalRecord (serialized)
pub const AUTO_COLLECT_APPROVALS: TableDefinition<u64, &[u8]> =
    TableDefinition::new("auto_collect_approvals");

/// User approvals index: user_id -> approval_id
pub const USER_APPROVALS: MultimapTableDefinition<u64, u64> =
    MultimapTableDefinition::new("user_approvals");

/// Auto-collect rules: rule_id -> AutoCollectRuleRecord (serialized)
pub const AUTO_COLLECT_RULES: TableDefinition<u64, &[u8]> =
    TableDefinition::new("auto_collect_rules");

/// Feedback table: feedback_id -> FeedbackRecord (serialized)
pub const FEEDBACK: TableDefinition<u64, &[u8]> = TableDefinition::new("feedback");

/// Id sequences: entity name -> last allocated id
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");
