use serde::{Deserialize, Serialize, Serializer};

use crate::models::UserSummary;

/// Status of a relationship as seen from one side of the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    /// The viewer sent a request that is still pending
    Outgoing,
    /// The viewer received a request that is still pending
    Incoming,
    Accepted,
}

/// Key of the stored pair record: the unordered pair, lower id first
pub fn pair_key(a: u64, b: u64) -> (u64, u64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// One record per unordered pair of users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendshipRecord {
    /// The user who sent the original request
    pub requester_id: u64,
    pub accepted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FriendshipRecord {
    pub fn requested_by(requester_id: u64, now: i64) -> Self {
        Self {
            requester_id,
            accepted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Directional status of the pair for `user_id`
    pub fn status_for(&self, user_id: u64) -> FriendStatus {
        if self.accepted {
            FriendStatus::Accepted
        } else if self.requester_id == user_id {
            FriendStatus::Outgoing
        } else {
            FriendStatus::Incoming
        }
    }
}

/// What `request_or_respond` does given the caller's current status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No relationship yet: send a new request
    Request,
    /// Caller withdraws the request they sent
    Withdraw,
    /// Caller accepts the request they received
    Accept,
    /// Caller removes an accepted friend
    Unfriend,
}

impl Transition {
    pub fn from_status(current: Option<FriendStatus>) -> Self {
        match current {
            None => Transition::Request,
            Some(FriendStatus::Outgoing) => Transition::Withdraw,
            Some(FriendStatus::Incoming) => Transition::Accept,
            Some(FriendStatus::Accepted) => Transition::Unfriend,
        }
    }

    /// Caller's status once the transition is applied
    pub fn resulting_status(self) -> Option<FriendStatus> {
        match self {
            Transition::Request => Some(FriendStatus::Outgoing),
            Transition::Accept => Some(FriendStatus::Accepted),
            Transition::Withdraw | Transition::Unfriend => None,
        }
    }
}

/// Serialize a missing status as `false`, the shape profile views expect
pub fn status_or_false<S: Serializer>(
    status: &Option<FriendStatus>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match status {
        Some(status) => status.serialize(serializer),
        None => serializer.serialize_bool(false),
    }
}

/// A relationship of a user, with the counterpart's public profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendEntry {
    pub friend_id: u64,
    pub status: FriendStatus,
    pub user: UserSummary,
}

/// Directional accepted row `user_id -> friend_id` returned by the
/// mutual friends query, with the profile of `user_id`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutualFriend {
    pub user_id: u64,
    pub friend_id: u64,
    pub user: UserSummary,
}
