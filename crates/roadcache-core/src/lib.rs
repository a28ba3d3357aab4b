//! roadcache - offline-first data layer for a driving school quiz app.
//!
//! This crate keeps the app usable without connectivity: versioned cache
//! partitions hold the app shell and quiz content, a request interceptor
//! routes every outgoing fetch to a per-path strategy with offline
//! fallbacks, finished quiz attempts queue durably until the server
//! acknowledges them, and push subscriptions round-trip through the same
//! API client. The `worker` module ties it together behind a single
//! event dispatcher.

pub mod api;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod models;
pub mod outbox;
pub mod prefs;
pub mod push;
pub mod quiz;
pub mod sync;
pub mod worker;

pub use api::{ApiClient, ApiError};
pub use cache::{CacheTiers, PartitionRole, ResponseSnapshot};
pub use config::Config;
pub use fetch::{FetchBackend, FetchError, HttpGateway, RequestDescriptor, RequestInterceptor};
pub use models::{builtin_offline_quiz, QuizAttemptRecord, QuizDefinition, QuizQuestion};
pub use outbox::ResultOutbox;
pub use prefs::LocalPrefs;
pub use push::{ClickOutcome, NotificationRelay, PushBackend};
pub use quiz::{AttemptOutcome, QuizSession, SessionPhase};
pub use sync::{DrainReport, SubmitBackend, SyncCoordinator};
pub use worker::{dispatch, EventOutcome, Services, WorkerEvent, QUIZ_SYNC_TAG};
