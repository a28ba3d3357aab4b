use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::fetch::{FetchBackend, RequestDescriptor};

// ============================================================================
// Constants
// ============================================================================

/// Shell partition name. Bump the version suffix on each app release so
/// `activate` purges the previous generation.
const SHELL_PARTITION: &str = "roadcache-shell-v1.0.0";

/// Partition holding the synthesized offline-fallback document.
const OFFLINE_PARTITION: &str = "roadcache-offline-v1";

/// Partition holding cacheable API responses (quiz content, reference data).
const QUIZ_PARTITION: &str = "roadcache-quiz-v1";

/// Shell resources fetched at install time. Install is all-or-nothing:
/// a partial shell cannot boot the app offline.
pub const SHELL_MANIFEST: [&str; 6] = [
    "/",
    "/static/js/bundle.js",
    "/static/css/main.css",
    "/manifest.json",
    "/icon-192x192.png",
    "/icon-512x512.png",
];

/// Reserved key the offline-fallback document is stored under.
const OFFLINE_DOCUMENT_KEY: &str = "/offline.html";

const OFFLINE_DOCUMENT_HTML: &str = r#"<!DOCTYPE html>
<html lang="ar">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Offline - Drive School DZ</title>
  <style>
    body { font-family: 'Segoe UI', Tahoma, sans-serif; margin: 0; padding: 20px;
           background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white;
           text-align: center; min-height: 100vh; display: flex; flex-direction: column;
           justify-content: center; align-items: center; }
    .offline-container { max-width: 400px; padding: 40px; background: rgba(255,255,255,0.1);
                         border-radius: 15px; }
    h1 { margin: 0 0 20px 0; font-size: 2rem; }
    .feature-item { margin: 10px 0; padding: 10px; background: rgba(255,255,255,0.1);
                    border-radius: 8px; text-align: left; }
    .retry-btn { background: rgba(255,255,255,0.2); border: 2px solid rgba(255,255,255,0.3);
                 color: white; padding: 12px 30px; border-radius: 25px; cursor: pointer; }
  </style>
</head>
<body>
  <div class="offline-container">
    <h1>You're Offline</h1>
    <p>&#1571;&#1606;&#1578; &#1594;&#1610;&#1585; &#1605;&#1578;&#1589;&#1604; &#1576;&#1575;&#1604;&#1573;&#1606;&#1578;&#1585;&#1606;&#1578;</p>
    <p>Don't worry! Some features are available offline:</p>
    <div class="feature-item"><strong>Practice Quizzes</strong> - Take theory tests offline</div>
    <div class="feature-item"><strong>Browse States</strong> - View all 58 Algerian wilayas</div>
    <div class="feature-item"><strong>View Profile</strong> - Access your stored information</div>
    <button class="retry-btn" onclick="window.location.reload()">Try Again</button>
  </div>
</body>
</html>
"#;

// ============================================================================
// Response snapshots
// ============================================================================

/// A stored HTTP response: status, content type and raw body. This is the
/// unit the partitions hold and the interceptor returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    pub fn new(status: u16, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
        }
    }

    /// Build a JSON response from any serializable value. Serialization of
    /// the synthesized payloads cannot fail in practice; if it ever does,
    /// the body degrades to empty rather than panicking.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|e| {
            error!(error = %e, "Failed to serialize synthesized response body");
            Vec::new()
        });
        Self::new(status, "application/json", body)
    }

    pub fn html(status: u16, body: &str) -> Self {
        Self::new(status, "text/html", body.as_bytes().to_vec())
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self::new(status, "text/plain", body.as_bytes().to_vec())
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).context("Failed to parse response body as JSON")
    }
}

/// The synthesized offline-fallback document served for HTML navigations
/// when both the network and the cache come up empty.
pub fn offline_document() -> ResponseSnapshot {
    ResponseSnapshot::html(200, OFFLINE_DOCUMENT_HTML)
}

// ============================================================================
// Partitions
// ============================================================================

/// The three logical cache roles. Exactly one partition per role is
/// current at any time; anything else on disk is a stale generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionRole {
    Shell,
    Offline,
    QuizData,
}

impl PartitionRole {
    pub const ALL: [PartitionRole; 3] = [
        PartitionRole::Shell,
        PartitionRole::Offline,
        PartitionRole::QuizData,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            PartitionRole::Shell => SHELL_PARTITION,
            PartitionRole::Offline => OFFLINE_PARTITION,
            PartitionRole::QuizData => QUIZ_PARTITION,
        }
    }
}

impl std::fmt::Display for PartitionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    cached_at: DateTime<Utc>,
    snapshot: ResponseSnapshot,
}

impl StoredEntry {
    fn new(snapshot: ResponseSnapshot) -> Self {
        Self {
            cached_at: Utc::now(),
            snapshot,
        }
    }
}

/// Manages the three named cache partitions on disk: one directory per
/// partition, one JSON file per stored response. Only this type writes
/// partitions; every other component reads through it.
pub struct CacheTiers {
    root: PathBuf,
}

impl CacheTiers {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create cache root {}", root.display()))?;
        Ok(Self { root })
    }

    fn partition_dir(&self, role: PartitionRole) -> PathBuf {
        self.root.join(role.dir_name())
    }

    fn entry_path(&self, role: PartitionRole, key: &str) -> PathBuf {
        self.partition_dir(role)
            .join(format!("{}.json", encode_key(key)))
    }

    /// Idempotently create the three partitions, fetch the shell manifest
    /// through the given backend and store it, and write the synthesized
    /// offline document. All shell fetches must succeed; any failure fails
    /// the whole install so a partial shell is never activated.
    pub async fn ensure_partitions(&self, backend: &impl FetchBackend) -> Result<()> {
        for role in PartitionRole::ALL {
            std::fs::create_dir_all(self.partition_dir(role)).with_context(|| {
                format!("Failed to create cache partition {}", role.dir_name())
            })?;
        }

        let fetches = SHELL_MANIFEST
            .iter()
            .map(|key| backend.fetch(RequestDescriptor::get(*key)));
        let snapshots = futures::future::try_join_all(fetches)
            .await
            .context("Failed to fetch shell manifest")?;

        for (key, snapshot) in SHELL_MANIFEST.iter().zip(snapshots) {
            if !snapshot.is_ok() {
                return Err(anyhow::anyhow!(
                    "Shell resource {} returned status {}",
                    key,
                    snapshot.status
                ));
            }
            self.put(PartitionRole::Shell, key, &snapshot)?;
        }

        self.put(PartitionRole::Offline, OFFLINE_DOCUMENT_KEY, &offline_document())?;

        info!(resources = SHELL_MANIFEST.len(), "Cache partitions installed");
        Ok(())
    }

    /// Delete every partition directory that is not one of the three
    /// current names. Returns the purged names.
    pub fn activate(&self) -> Result<Vec<String>> {
        let current: Vec<&str> = PartitionRole::ALL.iter().map(|r| r.dir_name()).collect();
        let mut purged = Vec::new();

        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to list cache root {}", self.root.display()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !current.contains(&name.as_str()) {
                info!(partition = %name, "Deleting stale cache partition");
                std::fs::remove_dir_all(entry.path())
                    .with_context(|| format!("Failed to delete stale partition {}", name))?;
                purged.push(name);
            }
        }

        Ok(purged)
    }

    /// Look a key up across all partitions, shell first. A read failure is
    /// a miss.
    pub fn get(&self, key: &str) -> Option<ResponseSnapshot> {
        PartitionRole::ALL
            .iter()
            .find_map(|role| self.get_in(*role, key))
    }

    pub fn get_in(&self, role: PartitionRole, key: &str) -> Option<ResponseSnapshot> {
        let path = self.entry_path(role, key);
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                debug!(key, partition = %role, error = %e, "Failed to read cache entry");
                return None;
            }
        };
        match serde_json::from_str::<StoredEntry>(&contents) {
            Ok(entry) => Some(entry.snapshot),
            Err(e) => {
                debug!(key, partition = %role, error = %e, "Failed to parse cache entry");
                None
            }
        }
    }

    pub fn put(&self, role: PartitionRole, key: &str, snapshot: &ResponseSnapshot) -> Result<()> {
        let dir = self.partition_dir(role);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache partition {}", role.dir_name()))?;
        let entry = StoredEntry::new(snapshot.clone());
        let contents = serde_json::to_string_pretty(&entry)?;
        std::fs::write(self.entry_path(role, key), contents)
            .with_context(|| format!("Failed to write cache entry for {}", key))?;
        Ok(())
    }

    /// Drop a whole partition. The next `ensure_partitions` recreates it.
    pub fn delete(&self, role: PartitionRole) -> Result<()> {
        let dir = self.partition_dir(role);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to delete partition {}", role.dir_name()))?;
        }
        Ok(())
    }

    pub fn offline_document(&self) -> Option<ResponseSnapshot> {
        self.get_in(PartitionRole::Offline, OFFLINE_DOCUMENT_KEY)
    }

    /// Decoded keys currently stored in a partition, sorted.
    pub fn keys(&self, role: PartitionRole) -> Result<Vec<String>> {
        let dir = self.partition_dir(role);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(encoded) = name.strip_suffix(".json") else {
                continue;
            };
            match decode_key(encoded) {
                Some(key) => keys.push(key),
                None => warn!(file = %name, partition = %role, "Unrecognized cache entry name"),
            }
        }
        keys.sort();
        Ok(keys)
    }
}

// ============================================================================
// Key encoding
// ============================================================================

/// Encode a request key into a filename-safe form. Alphanumerics, dots and
/// dashes pass through; every other byte (including the escape character
/// itself) becomes an `_xx` hex escape, so the mapping is reversible.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'-' => out.push(byte as char),
            other => {
                out.push('_');
                out.push_str(&format!("{:02x}", other));
            }
        }
    }
    out
}

fn decode_key(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' {
            if i + 2 >= bytes.len() {
                return None;
            }
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

// ============================================================================
// Tests
// ============================================================================
