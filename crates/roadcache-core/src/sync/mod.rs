//! Background synchronization of queued quiz attempts.
//!
//! A drain runs when connectivity returns, when the quiz sync tag fires,
//! and right after an attempt is queued while already online. It walks
//! the outbox snapshot in insertion order and submits each record on its
//! own: one rejected attempt never blocks the rest, and a record is only
//! removed once the server has acknowledged it. Drains are serialized so
//! overlapping triggers cannot double-submit.

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::models::QuizAttemptRecord;
use crate::outbox::ResultOutbox;

/// Server-side acknowledgment of one quiz attempt.
///
/// The HTTP client implements this for production; tests script it.
#[allow(async_fn_in_trait)]
pub trait SubmitBackend {
    async fn submit_attempt(&self, record: &QuizAttemptRecord) -> anyhow::Result<()>;
}

/// What one drain pass accomplished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Records acknowledged by the server and removed from the outbox.
    pub submitted: usize,
    /// Records whose submission failed; they stay queued for next time.
    pub failed: usize,
    /// Records still queued after the pass, including any appended while
    /// it ran.
    pub remaining: usize,
}

pub struct SyncCoordinator {
    drain_lock: Mutex<()>,
}

impl SyncCoordinator {
    pub fn new() -> Self {
        Self {
            drain_lock: Mutex::new(()),
        }
    }

    /// Submit every queued record, one at a time, in insertion order.
    ///
    /// Never fails: storage problems are logged and reflected in the
    /// report instead. Records appended while a drain is running are left
    /// for the next pass.
    pub async fn drain(&self, outbox: &ResultOutbox, backend: &impl SubmitBackend) -> DrainReport {
        let _guard = self.drain_lock.lock().await;

        let snapshot = match outbox.list() {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "Failed to read outbox for sync");
                return DrainReport::default();
            }
        };

        if snapshot.is_empty() {
            debug!("Outbox empty, nothing to sync");
            return DrainReport::default();
        }

        let mut report = DrainReport::default();
        for record in &snapshot {
            match backend.submit_attempt(record).await {
                Ok(()) => {
                    report.submitted += 1;
                    match outbox.remove(&record.id) {
                        Ok(_) => info!(id = %record.id, "Synced quiz attempt"),
                        Err(e) => {
                            warn!(id = %record.id, error = %e, "Synced but failed to dequeue")
                        }
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(id = %record.id, error = %e, "Failed to sync quiz attempt, keeping queued");
                }
            }
        }

        report.remaining = outbox.len();
        info!(
            submitted = report.submitted,
            failed = report.failed,
            remaining = report.remaining,
            "Sync pass finished"
        );
        report
    }
}

impl Default for SyncCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::builtin_offline_quiz;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Scripted backend: accepts or rejects by record id and remembers
    /// every submission it saw.
    struct FakeSubmitBackend {
        reject: Vec<String>,
        submissions: RefCell<Vec<String>>,
    }

    impl FakeSubmitBackend {
        fn accepting() -> Self {
            Self {
                reject: Vec::new(),
                submissions: RefCell::new(Vec::new()),
            }
        }

        fn rejecting(ids: &[&str]) -> Self {
            Self {
                reject: ids.iter().map(|s| s.to_string()).collect(),
                submissions: RefCell::new(Vec::new()),
            }
        }
    }

    impl SubmitBackend for FakeSubmitBackend {
        async fn submit_attempt(&self, record: &QuizAttemptRecord) -> anyhow::Result<()> {
            self.submissions.borrow_mut().push(record.id.clone());
            if self.reject.contains(&record.id) {
                anyhow::bail!("server rejected attempt");
            }
            Ok(())
        }
    }

    fn outbox_with(ids: &[&str]) -> (tempfile::TempDir, ResultOutbox) {
        let dir = tempfile::tempdir().expect("tempdir");
        let outbox = ResultOutbox::new(dir.path().to_path_buf()).expect("outbox");
        for id in ids {
            let mut record = QuizAttemptRecord::from_session(
                &builtin_offline_quiz(),
                HashMap::new(),
                10,
                true,
            );
            record.id = id.to_string();
            outbox.append(&record).expect("append");
        }
        (dir, outbox)
    }

    #[tokio::test]
    async fn test_drain_submits_in_insertion_order() {
        let (_dir, outbox) = outbox_with(&["r1", "r2", "r3"]);
        let backend = FakeSubmitBackend::accepting();
        let sync = SyncCoordinator::new();

        let report = sync.drain(&outbox, &backend).await;

        assert_eq!(
            report,
            DrainReport {
                submitted: 3,
                failed: 0,
                remaining: 0
            }
        );
        assert_eq!(*backend.submissions.borrow(), vec!["r1", "r2", "r3"]);
        assert!(outbox.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_record_stays_queued_without_blocking_others() {
        let (_dir, outbox) = outbox_with(&["r1", "r2", "r3"]);
        let backend = FakeSubmitBackend::rejecting(&["r2"]);
        let sync = SyncCoordinator::new();

        let report = sync.drain(&outbox, &backend).await;

        assert_eq!(report.submitted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.remaining, 1);
        // r3 was still attempted even though r2 failed.
        assert_eq!(*backend.submissions.borrow(), vec!["r1", "r2", "r3"]);

        let left: Vec<String> = outbox.list().expect("list").into_iter().map(|r| r.id).collect();
        assert_eq!(left, vec!["r2"]);
    }

    #[tokio::test]
    async fn test_drain_empty_outbox_is_a_no_op() {
        let (_dir, outbox) = outbox_with(&[]);
        let backend = FakeSubmitBackend::accepting();
        let sync = SyncCoordinator::new();

        let report = sync.drain(&outbox, &backend).await;

        assert_eq!(report, DrainReport::default());
        assert!(backend.submissions.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_drains_submit_each_record_once() {
        let (_dir, outbox) = outbox_with(&["only"]);
        let backend = FakeSubmitBackend::accepting();
        let sync = SyncCoordinator::new();

        let (first, second) = tokio::join!(
            sync.drain(&outbox, &backend),
            sync.drain(&outbox, &backend)
        );

        // One drain sees the record, the serialized other sees an empty
        // outbox.
        assert_eq!(first.submitted + second.submitted, 1);
        assert_eq!(backend.submissions.borrow().len(), 1);
        assert!(outbox.is_empty());
    }

    #[tokio::test]
    async fn test_failed_record_is_retried_on_next_drain() {
        let (_dir, outbox) = outbox_with(&["r1"]);
        let sync = SyncCoordinator::new();

        let rejecting = FakeSubmitBackend::rejecting(&["r1"]);
        let report = sync.drain(&outbox, &rejecting).await;
        assert_eq!(report.failed, 1);
        assert_eq!(outbox.len(), 1);

        let accepting = FakeSubmitBackend::accepting();
        let report = sync.drain(&outbox, &accepting).await;
        assert_eq!(report.submitted, 1);
        assert!(outbox.is_empty());
    }
}
