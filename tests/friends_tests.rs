//! Relationship state machine tests against a real database with an
//! in-memory cache and a recording notifier.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use tpu_server::cache::{Cache, MemoryCache};
use tpu_server::constants::friend_notification_key;
use tpu_server::models::FriendStatus;
use tpu_server::services::{Notifier, RelationshipManager, UserService};
use tpu_server::{open_database, AppError, Config, Db};

// =============================================================================
// Test Helpers
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Sent {
    user_id: u64,
    message: String,
    route: Option<String>,
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn sent_to(&self, user_id: u64) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|sent| sent.user_id == user_id)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        user_id: u64,
        message: &str,
        route: Option<&str>,
    ) -> tpu_server::Result<()> {
        self.sent.lock().unwrap().push(Sent {
            user_id,
            message: message.to_string(),
            route: route.map(str::to_string),
        });
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _: u64, _: &str, _: Option<&str>) -> tpu_server::Result<()> {
        Err(AppError::NotFound)
    }
}

struct Harness {
    _temp_dir: TempDir,
    cache: Arc<MemoryCache>,
    notifier: Arc<RecordingNotifier>,
    friends: Arc<RelationshipManager>,
    users: UserService,
}

fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_path: temp_dir.path().join("test.db").to_string_lossy().into_owned(),
        redis_url: None,
        allowed_origins: Vec::new(),
        environment: "test".to_string(),
        session_secret: "test-session-secret".to_string(),
        bcrypt_cost: 4,
        friend_notification_ttl_secs: 1800,
        admin_username: None,
    }
}

fn harness_with(notifier: Arc<dyn Notifier>) -> (TempDir, Db, Arc<MemoryCache>, Arc<RelationshipManager>, UserService) {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);
    let db = open_database(&config.database_path).unwrap();
    let cache = Arc::new(MemoryCache::new());
    let friends = Arc::new(RelationshipManager::new(
        db.clone(),
        cache.clone(),
        notifier,
        config.friend_notification_ttl_secs,
    ));
    let users = UserService::new(db.clone(), cache.clone(), friends.clone(), config);
    (temp_dir, db, cache, friends, users)
}

fn harness() -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let (temp_dir, _, cache, friends, users) = harness_with(notifier.clone());
    Harness {
        _temp_dir: temp_dir,
        cache,
        notifier,
        friends,
        users,
    }
}

async fn user(users: &UserService, name: &str) -> u64 {
    users
        .register(name, &format!("{}@example.com", name), "password")
        .await
        .unwrap()
        .id
}

/// Both directional views of a pair
async fn views(friends: &RelationshipManager, a: u64, b: u64) -> (Option<FriendStatus>, Option<FriendStatus>) {
    (
        friends.get_friend_status(a, b).await.unwrap(),
        friends.get_friend_status(b, a).await.unwrap(),
    )
}

fn consistent(views: (Option<FriendStatus>, Option<FriendStatus>)) -> bool {
    use FriendStatus::*;
    matches!(
        views,
        (None, None)
            | (Some(Accepted), Some(Accepted))
            | (Some(Outgoing), Some(Incoming))
            | (Some(Incoming), Some(Outgoing))
    )
}

// =============================================================================
// Transition Tests
// =============================================================================

#[tokio::test]
async fn test_request_creates_outgoing_and_incoming() {
    let h = harness();
    let alice = user(&h.users, "alice").await;
    let bob = user(&h.users, "bob").await;

    let status = h.friends.request_or_respond(alice, bob).await.unwrap();

    assert_eq!(status, Some(FriendStatus::Outgoing));
    assert_eq!(
        views(&h.friends, alice, bob).await,
        (Some(FriendStatus::Outgoing), Some(FriendStatus::Incoming))
    );
    assert_eq!(
        h.notifier.sent(),
        vec![Sent {
            user_id: bob,
            message: "alice has sent you a friend request!".to_string(),
            route: Some("/u/alice".to_string()),
        }]
    );
    assert_eq!(
        h.cache
            .get(&friend_notification_key(bob, alice))
            .await
            .unwrap()
            .as_deref(),
        Some("true")
    );
}

#[tokio::test]
async fn test_repeat_request_within_window_is_suppressed() {
    let h = harness();
    let alice = user(&h.users, "alice").await;
    let bob = user(&h.users, "bob").await;

    // request, withdraw, request again
    h.friends.request_or_respond(alice, bob).await.unwrap();
    assert_eq!(h.friends.request_or_respond(alice, bob).await.unwrap(), None);
    assert_eq!(views(&h.friends, alice, bob).await, (None, None));
    h.friends.request_or_respond(alice, bob).await.unwrap();

    assert_eq!(h.notifier.sent_to(bob).len(), 1);
}

#[tokio::test]
async fn test_lost_suppression_key_allows_extra_notification() {
    let h = harness();
    let alice = user(&h.users, "alice").await;
    let bob = user(&h.users, "bob").await;

    h.friends.request_or_respond(alice, bob).await.unwrap();
    h.friends.request_or_respond(alice, bob).await.unwrap();
    h.cache.del(&friend_notification_key(bob, alice)).await.unwrap();
    h.friends.request_or_respond(alice, bob).await.unwrap();

    assert_eq!(h.notifier.sent_to(bob).len(), 2);
}

#[tokio::test]
async fn test_accept_notifies_requester_once() {
    let h = harness();
    let alice = user(&h.users, "alice").await;
    let bob = user(&h.users, "bob").await;

    h.friends.request_or_respond(alice, bob).await.unwrap();
    let status = h.friends.request_or_respond(bob, alice).await.unwrap();

    assert_eq!(status, Some(FriendStatus::Accepted));
    assert_eq!(
        views(&h.friends, alice, bob).await,
        (Some(FriendStatus::Accepted), Some(FriendStatus::Accepted))
    );
    let to_alice = h.notifier.sent_to(alice);
    assert_eq!(to_alice.len(), 1);
    assert_eq!(to_alice[0].message, "bob has accepted your friend request!");
    assert_eq!(to_alice[0].route.as_deref(), Some("/u/bob"));
}

#[tokio::test]
async fn test_accepted_then_unfriend() {
    let h = harness();
    let alice = user(&h.users, "alice").await;
    let bob = user(&h.users, "bob").await;

    h.friends.request_or_respond(alice, bob).await.unwrap();
    h.friends.request_or_respond(bob, alice).await.unwrap();
    let status = h.friends.request_or_respond(alice, bob).await.unwrap();

    assert_eq!(status, None);
    assert_eq!(views(&h.friends, alice, bob).await, (None, None));
    assert!(h.friends.list_friends(alice).await.unwrap().is_empty());
    assert!(h.friends.list_friends(bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_friend_twice_is_idempotent() {
    let h = harness();
    let alice = user(&h.users, "alice").await;
    let bob = user(&h.users, "bob").await;

    h.friends.request_or_respond(alice, bob).await.unwrap();
    h.friends.request_or_respond(bob, alice).await.unwrap();

    h.friends.remove_friend(bob, alice).await.unwrap();
    h.friends.remove_friend(bob, alice).await.unwrap();

    assert_eq!(views(&h.friends, alice, bob).await, (None, None));
}

#[tokio::test]
async fn test_cannot_friend_self_before_storage() {
    let h = harness();

    // No users exist: the self check fires before any lookup
    let err = h.friends.request_or_respond(7, 7).await.unwrap_err();

    assert!(matches!(err, AppError::CannotFriendSelf));
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_unknown_users_rejected() {
    let h = harness();
    let alice = user(&h.users, "alice").await;

    let err = h.friends.request_or_respond(alice, 999).await.unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));

    let err = h.friends.request_or_respond(999, alice).await.unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));

    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_get_friend_status_does_not_mutate() {
    let h = harness();
    let alice = user(&h.users, "alice").await;
    let bob = user(&h.users, "bob").await;

    assert_eq!(views(&h.friends, alice, bob).await, (None, None));
    assert!(h.notifier.sent().is_empty());
    assert!(h
        .cache
        .get(&friend_notification_key(bob, alice))
        .await
        .unwrap()
        .is_none());

    // A later request still notifies
    h.friends.request_or_respond(alice, bob).await.unwrap();
    assert_eq!(h.notifier.sent_to(bob).len(), 1);
}

#[tokio::test]
async fn test_failed_notify_keeps_transition() {
    let (_temp_dir, _, _, friends, users) = harness_with(Arc::new(FailingNotifier));
    let alice = user(&users, "alice").await;
    let bob = user(&users, "bob").await;

    let status = friends.request_or_respond(alice, bob).await.unwrap();

    assert_eq!(status, Some(FriendStatus::Outgoing));
    assert_eq!(
        views(&friends, alice, bob).await,
        (Some(FriendStatus::Outgoing), Some(FriendStatus::Incoming))
    );
}

// =============================================================================
// Invariant Tests
// =============================================================================

#[tokio::test]
async fn test_pair_views_stay_consistent_over_sequences() {
    let h = harness();
    let mut ids = Vec::new();
    for name in ["alice", "bob", "carol"] {
        ids.push(user(&h.users, name).await);
    }

    // Deterministic walk over every ordered pair with removals mixed in
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    for step in 0..60 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let a = ids[(seed % 3) as usize];
        let b = ids[((seed >> 8) % 3) as usize];
        if a == b {
            continue;
        }

        if step % 7 == 6 {
            h.friends.remove_friend(a, b).await.unwrap();
        } else {
            h.friends.request_or_respond(a, b).await.unwrap();
        }

        for &x in &ids {
            for &y in &ids {
                if x < y {
                    let pair = views(&h.friends, x, y).await;
                    assert!(consistent(pair), "step {}: {:?}", step, pair);
                }
            }
        }
    }
}

#[tokio::test]
async fn test_concurrent_requests_from_both_directions() {
    let h = harness();

    for round in 0..10 {
        let a = user(&h.users, &format!("a{}", round)).await;
        let b = user(&h.users, &format!("b{}", round)).await;

        let first = {
            let friends = h.friends.clone();
            tokio::spawn(async move { friends.request_or_respond(a, b).await })
        };
        let second = {
            let friends = h.friends.clone();
            tokio::spawn(async move { friends.request_or_respond(b, a).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        // One request, then its acceptance, in whichever order they serialized
        assert_eq!(
            views(&h.friends, a, b).await,
            (Some(FriendStatus::Accepted), Some(FriendStatus::Accepted))
        );
    }
}

// =============================================================================
// Mutual Friends Tests
// =============================================================================

#[tokio::test]
async fn test_mutual_friends_are_accepted_friends_of_both() {
    let h = harness();
    let alice = user(&h.users, "alice").await;
    let bob = user(&h.users, "bob").await;
    let carol = user(&h.users, "carol").await;
    let dave = user(&h.users, "dave").await;

    async fn befriend(friends: &RelationshipManager, a: u64, b: u64) {
        friends.request_or_respond(a, b).await.unwrap();
        friends.request_or_respond(b, a).await.unwrap();
    }

    befriend(&h.friends, alice, bob).await;
    befriend(&h.friends, alice, carol).await;
    befriend(&h.friends, carol, dave).await;
    // Pending only: does not count
    h.friends.request_or_respond(bob, dave).await.unwrap();

    let mutual = h.friends.mutual_friends(alice, dave).await.unwrap();

    assert_eq!(mutual.len(), 1);
    assert_eq!(mutual[0].user_id, carol);
    assert_eq!(mutual[0].friend_id, dave);
    assert_eq!(mutual[0].user.username, "carol");

    // The other user is never listed as their own mutual friend
    let mutual = h.friends.mutual_friends(alice, carol).await.unwrap();
    assert!(mutual.is_empty());
}

#[tokio::test]
async fn test_profile_lists_mutual_friends_and_status() {
    let h = harness();
    let alice = user(&h.users, "alice").await;
    let bob = user(&h.users, "bob").await;
    let carol = user(&h.users, "carol").await;

    h.friends.request_or_respond(alice, carol).await.unwrap();
    h.friends.request_or_respond(carol, alice).await.unwrap();
    h.friends.request_or_respond(bob, carol).await.unwrap();
    h.friends.request_or_respond(carol, bob).await.unwrap();
    h.friends.request_or_respond(alice, bob).await.unwrap();

    // alice views bob: carol is friends with both
    let profile = h.users.profile("bob", alice).await.unwrap();

    assert_eq!(profile.friend, Some(FriendStatus::Outgoing));
    assert_eq!(profile.friends.len(), 1);
    assert_eq!(profile.friends[0].user_id, carol);
    assert_eq!(profile.friends[0].friend_id, alice);
}
