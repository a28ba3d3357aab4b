//! Durable queue of quiz attempts awaiting server acknowledgment.
//!
//! One JSON file per record under the data directory, named with a
//! monotonic sequence prefix so insertion order survives restarts. The
//! session engine appends, the sync coordinator removes; everything else
//! only reads.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::QuizAttemptRecord;

/// Width of the zero-padded sequence prefix in entry file names.
const SEQ_WIDTH: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QueuedRecord {
    seq: u64,
    queued_at: DateTime<Utc>,
    record: QuizAttemptRecord,
}

pub struct ResultOutbox {
    dir: PathBuf,
}

impl ResultOutbox {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create outbox directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn entry_name(seq: u64, id: &str) -> String {
        format!("{:0width$}-{}.json", seq, id, width = SEQ_WIDTH)
    }

    /// Durably store one record. An id already present is left untouched;
    /// appending it again is a logged no-op, never an overwrite.
    pub fn append(&self, record: &QuizAttemptRecord) -> Result<()> {
        if self.contains(&record.id) {
            warn!(id = %record.id, "Attempt record already queued, skipping append");
            return Ok(());
        }

        let seq = self.next_seq()?;
        let queued = QueuedRecord {
            seq,
            queued_at: Utc::now(),
            record: record.clone(),
        };
        let contents = serde_json::to_string_pretty(&queued)?;
        let path = self.dir.join(Self::entry_name(seq, &record.id));
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write outbox record {}", record.id))?;
        debug!(id = %record.id, seq, "Attempt record queued");
        Ok(())
    }

    /// All queued records in insertion order. Unreadable entries are
    /// skipped with a warning rather than failing the whole listing.
    pub fn list(&self) -> Result<Vec<QuizAttemptRecord>> {
        let mut queued: Vec<QueuedRecord> = Vec::new();
        for name in self.entry_names()? {
            let path = self.dir.join(&name);
            let contents = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!(file = %name, error = %e, "Failed to read outbox entry");
                    continue;
                }
            };
            match serde_json::from_str::<QueuedRecord>(&contents) {
                Ok(entry) => queued.push(entry),
                Err(e) => {
                    warn!(file = %name, error = %e, "Failed to parse outbox entry, skipping");
                }
            }
        }
        queued.sort_by_key(|q| q.seq);
        Ok(queued.into_iter().map(|q| q.record).collect())
    }

    /// Remove one record by id. Removing an id that is not queued is a
    /// no-op returning false, which keeps retries idempotent.
    pub fn remove(&self, id: &str) -> Result<bool> {
        for name in self.entry_names()? {
            if Self::entry_id(&name) == Some(id) {
                std::fs::remove_file(self.dir.join(&name))
                    .with_context(|| format!("Failed to remove outbox record {}", id))?;
                debug!(id, "Attempt record removed from outbox");
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entry_names()
            .map(|names| names.iter().any(|n| Self::entry_id(n) == Some(id)))
            .unwrap_or(false)
    }

    /// Number of queued records, shown as the "pending sync" count.
    /// A listing failure reads as empty rather than crashing the caller.
    pub fn len(&self) -> usize {
        match self.entry_names() {
            Ok(names) => names.len(),
            Err(e) => {
                debug!(error = %e, "Failed to count outbox entries");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list outbox {}", self.dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Extract the record id from an entry file name
    /// (`{seq}-{id}.json`).
    fn entry_id(name: &str) -> Option<&str> {
        let stem = name.strip_suffix(".json")?;
        if stem.len() <= SEQ_WIDTH + 1 {
            return None;
        }
        let (seq, rest) = stem.split_at(SEQ_WIDTH);
        if !seq.bytes().all(|b| b.is_ascii_digit()) || !rest.starts_with('-') {
            return None;
        }
        Some(&rest[1..])
    }

    fn next_seq(&self) -> Result<u64> {
        let max = self
            .entry_names()?
            .iter()
            .filter_map(|n| n.get(..SEQ_WIDTH)?.parse::<u64>().ok())
            .max();
        Ok(max.map_or(1, |m| m + 1))
    }
}

// ============================================================================
// Tests
// ============================================================================
