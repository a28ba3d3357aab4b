//! Worker event dispatcher.
//!
//! The single entry point for lifecycle and runtime events raised by the
//! host: install, activate, fetch, background sync, connectivity
//! changes, push delivery, and notification clicks. Every event routes
//! to exactly one service; events nothing cares about come back as
//! `Ignored` rather than errors.

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::{CacheTiers, ResponseSnapshot};
use crate::fetch::{FetchBackend, RequestDescriptor, RequestInterceptor};
use crate::models::NotificationDisplay;
use crate::outbox::ResultOutbox;
use crate::push::{ClickOutcome, NotificationRelay};
use crate::sync::{DrainReport, SubmitBackend, SyncCoordinator};

/// Background sync registration tag for queued quiz attempts.
pub const QUIZ_SYNC_TAG: &str = "quiz-sync";

/// An event raised by the host platform.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// First launch or an update: populate the cache partitions.
    Install,
    /// The new version took over: purge stale partitions.
    Activate,
    /// An outgoing request to route.
    Fetch(RequestDescriptor),
    /// A registered sync tag fired.
    BackgroundSync { tag: String },
    /// The device went online or offline.
    ConnectivityChanged { online: bool },
    /// A push message arrived, possibly without a payload.
    Push { body: Option<String> },
    /// The user tapped a displayed notification.
    NotificationClick {
        action: Option<String>,
        data: Value,
    },
}

impl WorkerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerEvent::Install => "install",
            WorkerEvent::Activate => "activate",
            WorkerEvent::Fetch(_) => "fetch",
            WorkerEvent::BackgroundSync { .. } => "background_sync",
            WorkerEvent::ConnectivityChanged { .. } => "connectivity_changed",
            WorkerEvent::Push { .. } => "push",
            WorkerEvent::NotificationClick { .. } => "notification_click",
        }
    }
}

/// What handling an event produced.
#[derive(Debug, PartialEq)]
pub enum EventOutcome {
    Installed,
    /// Stale partition names deleted during activation.
    Activated { purged: Vec<String> },
    Response(ResponseSnapshot),
    Synced(DrainReport),
    Notification(NotificationDisplay),
    Click(ClickOutcome),
    /// The event required no action.
    Ignored,
}

/// Everything the dispatcher routes events to. The backends are generic
/// so tests can script them.
pub struct Services<'a, F: FetchBackend, S: SubmitBackend> {
    pub tiers: &'a CacheTiers,
    pub outbox: &'a ResultOutbox,
    pub interceptor: &'a RequestInterceptor,
    pub sync: &'a SyncCoordinator,
    pub relay: &'a NotificationRelay,
    pub fetcher: &'a F,
    pub submitter: &'a S,
}

/// Route one event to its service.
///
/// Only install, activation, and non-GET fetches can fail; the runtime
/// paths (routed GETs, sync, push) always produce an outcome.
pub async fn dispatch<F: FetchBackend, S: SubmitBackend>(
    event: WorkerEvent,
    services: &Services<'_, F, S>,
) -> anyhow::Result<EventOutcome> {
    debug!(event = event.kind(), "Dispatching worker event");
    match event {
        WorkerEvent::Install => {
            services.tiers.ensure_partitions(services.fetcher).await?;
            Ok(EventOutcome::Installed)
        }
        WorkerEvent::Activate => {
            let purged = services.tiers.activate()?;
            Ok(EventOutcome::Activated { purged })
        }
        WorkerEvent::Fetch(request) => {
            let snapshot = services
                .interceptor
                .handle(&request, services.tiers, services.fetcher)
                .await?;
            Ok(EventOutcome::Response(snapshot))
        }
        WorkerEvent::BackgroundSync { tag } => {
            if tag != QUIZ_SYNC_TAG {
                debug!(tag, "Ignoring unknown sync tag");
                return Ok(EventOutcome::Ignored);
            }
            let report = services.sync.drain(services.outbox, services.submitter).await;
            Ok(EventOutcome::Synced(report))
        }
        WorkerEvent::ConnectivityChanged { online } => {
            if !online {
                debug!("Went offline, queued attempts will wait");
                return Ok(EventOutcome::Ignored);
            }
            info!("Back online, syncing queued attempts");
            let report = services.sync.drain(services.outbox, services.submitter).await;
            Ok(EventOutcome::Synced(report))
        }
        WorkerEvent::Push { body } => {
            match services.relay.handle_push(body.as_deref()) {
                Some(notification) => Ok(EventOutcome::Notification(notification)),
                None => Ok(EventOutcome::Ignored),
            }
        }
        WorkerEvent::NotificationClick { action, data } => {
            let outcome = services.relay.handle_click(action.as_deref(), &data);
            Ok(EventOutcome::Click(outcome))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
