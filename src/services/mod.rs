//! Domain services shared by the HTTP handlers

pub mod auto_collect;
pub mod collections;
pub mod friends;
pub mod notifications;
pub mod users;

pub use auto_collect::AutoCollectWorkflow;
pub use collections::CollectionService;
pub use friends::RelationshipManager;
pub use notifications::{NotificationService, Notifier};
pub use users::UserService;
