//! Data models for the driving-school data layer.
//!
//! This module contains the data structures shared across components:
//!
//! - `QuizDefinition`, `QuizQuestion`: quiz content with scoring helpers
//! - `QuizAttemptRecord`: the durable result written to the outbox
//! - `StatesResponse`, `ALGERIAN_WILAYAS`: reference-data shapes
//! - Push types: `PushPayload`, `PushSubscription`, `NotificationDisplay`

pub mod attempt;
pub mod push;
pub mod quiz;
pub mod region;

pub use attempt::QuizAttemptRecord;
pub use push::{DevicePlatform, NotificationDisplay, PushPayload, PushSubscription};
pub use quiz::{builtin_offline_quiz, QuizDefinition, QuizQuestion};
pub use region::{StatesResponse, ALGERIAN_WILAYAS};
