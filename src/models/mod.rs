pub mod auto_collect;
pub mod collection;
pub mod feedback;
pub mod friend;
pub mod notification;
pub mod user;

pub use auto_collect::{
    ApprovalAction, AutoCollectApproval, AutoCollectApprovalRecord, AutoCollectRule,
    AutoCollectRuleRecord, NewAutoCollectRule, PendingApproval,
};
pub use collection::{
    Collection, CollectionCache, CollectionItem, CollectionItemRecord, CollectionRecord,
    MutualCollection,
};
pub use feedback::{Feedback, FeedbackRecord, NewFeedback};
pub use friend::{FriendEntry, FriendStatus, FriendshipRecord, MutualFriend, Transition};
pub use notification::{Notification, NotificationRecord};
pub use user::{User, UserProfile, UserRecord, UserSummary, UserUpdate};
