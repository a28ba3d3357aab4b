//! Push notification subscription and display handling.

pub mod relay;

pub use relay::{ClickOutcome, NotificationRelay, PushBackend};
