pub mod notifier;
pub mod publisher;

pub use notifier::{Notification, NotificationLevel, Notifier};
pub use publisher::ViewPublisher;
