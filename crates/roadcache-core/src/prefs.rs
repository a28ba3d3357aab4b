//! Local durable preferences and snapshots.
//!
//! A small key/value store of JSON files under the data directory. Each
//! fixed key mirrors one piece of state the rendering layer persists:
//! the preferred language, the auth token and user snapshot (consumed
//! here, owned by the auth flow), and the last-known-good offline quiz
//! list used by the session engine's fallback chain.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::models::QuizDefinition;

/// UI language preference ("fr", "ar", "en")
const PREFERRED_LANGUAGE_KEY: &str = "preferred_language";

/// Bearer token for authenticated API calls
const AUTH_TOKEN_KEY: &str = "auth_token";

/// Opaque snapshot of the signed-in user's profile
const USER_DATA_KEY: &str = "user_data";

/// Last successfully fetched quiz list, kept for offline sessions
const OFFLINE_QUIZZES_KEY: &str = "offline_quizzes";

pub struct LocalPrefs {
    data_dir: PathBuf,
}

impl LocalPrefs {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create prefs directory {}", data_dir.display()))?;
        Ok(Self { data_dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    /// A read failure is treated as an absent value, never an error.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.key_path(key);
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                debug!(key, error = %e, "Failed to read pref");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "Failed to parse pref");
                None
            }
        }
    }

    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let contents = serde_json::to_string_pretty(value)?;
        std::fs::write(self.key_path(key), contents)
            .with_context(|| format!("Failed to write pref: {}", key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove pref: {}", key))?;
        }
        Ok(())
    }

    // ===== Language =====

    pub fn preferred_language(&self) -> Option<String> {
        self.get(PREFERRED_LANGUAGE_KEY)
    }

    pub fn set_preferred_language(&self, language: &str) -> Result<()> {
        self.set(PREFERRED_LANGUAGE_KEY, &language)
    }

    // ===== Auth snapshot =====

    pub fn auth_token(&self) -> Option<String> {
        self.get(AUTH_TOKEN_KEY)
    }

    pub fn set_auth_token(&self, token: &str) -> Result<()> {
        self.set(AUTH_TOKEN_KEY, &token)
    }

    pub fn clear_auth(&self) -> Result<()> {
        self.remove(AUTH_TOKEN_KEY)?;
        self.remove(USER_DATA_KEY)
    }

    pub fn user_data(&self) -> Option<serde_json::Value> {
        self.get(USER_DATA_KEY)
    }

    pub fn set_user_data(&self, data: &serde_json::Value) -> Result<()> {
        self.set(USER_DATA_KEY, data)
    }

    // ===== Offline quiz list =====

    pub fn offline_quizzes(&self) -> Option<Vec<QuizDefinition>> {
        self.get(OFFLINE_QUIZZES_KEY)
    }

    pub fn set_offline_quizzes(&self, quizzes: &[QuizDefinition]) -> Result<()> {
        self.set(OFFLINE_QUIZZES_KEY, &quizzes)
    }
}
