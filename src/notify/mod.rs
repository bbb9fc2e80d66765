//! Notification fan-out to branch administrators.

pub mod fanout;
pub mod types;

pub use fanout::{DispatchOutcome, NotificationFanout};
pub use types::{Notification, NotificationKind, NotificationPriority};
