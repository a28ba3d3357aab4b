use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::quiz::QuizDefinition;

/// The durable artifact of one finished quiz attempt.
///
/// Field names match the submission endpoint's JSON body; the record is
/// written to the outbox verbatim and posted unchanged during sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttemptRecord {
    pub id: String,
    pub quiz_id: String,
    pub answers: HashMap<u32, String>,
    pub score: u32,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
    /// Seconds spent before submission (or timer expiry).
    pub time_taken: u32,
    /// True when the attempt finished without connectivity.
    pub offline: bool,
}

impl QuizAttemptRecord {
    /// Build the record for a session that just reached its terminal state.
    /// Scoring follows the definition: unanswered counts as incorrect.
    pub fn from_session(
        definition: &QuizDefinition,
        answers: HashMap<u32, String>,
        time_taken: u32,
        offline: bool,
    ) -> Self {
        let completed_at = Utc::now();
        let score = definition.score_percent(&answers);
        Self {
            id: generate_record_id(completed_at),
            quiz_id: definition.id.clone(),
            answers,
            score,
            passed: score >= definition.passing_score,
            completed_at,
            time_taken,
            offline,
        }
    }
}

/// Millisecond timestamp plus a random suffix. The timestamp keeps ids
/// roughly ordered; the suffix avoids collisions when two attempts finish
/// in the same millisecond.
fn generate_record_id(completed_at: DateTime<Utc>) -> String {
    let suffix: u16 = rand::random();
    format!("{}-{:04x}", completed_at.timestamp_millis(), suffix)
}
