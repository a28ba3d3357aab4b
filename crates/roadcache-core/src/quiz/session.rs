//! Quiz attempt state machine.
//!
//! A session moves Idle -> Loading -> InProgress -> Completed and back.
//! Operations that do not apply to the current phase are no-ops, so a
//! double-tap on submit or a tick landing after the timer already expired
//! can never produce a second attempt record. Catalog loading is
//! ticketed: only the newest load installs its result.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::cache::CacheTiers;
use crate::fetch::{FetchBackend, RequestDescriptor, RequestInterceptor};
use crate::models::{builtin_offline_quiz, QuizAttemptRecord, QuizDefinition, QuizQuestion};
use crate::outbox::ResultOutbox;
use crate::prefs::LocalPrefs;

/// Endpoint serving the theory quiz catalog.
const QUIZ_CATALOG_PATH: &str = "/api/quizzes/theory";

/// Handle for one catalog load. A newer load supersedes older tickets;
/// a superseded result is discarded on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// What a finished attempt amounted to, kept for the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub score: u32,
    pub passed: bool,
    /// Id of the attempt record queued for sync.
    pub record_id: String,
}

/// Externally visible phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    InProgress,
    Completed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Loading => "loading",
            SessionPhase::InProgress => "in_progress",
            SessionPhase::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

enum Phase {
    Idle,
    Loading {
        ticket: LoadTicket,
    },
    InProgress {
        definition: QuizDefinition,
        index: usize,
        answers: HashMap<u32, String>,
        remaining_seconds: u32,
    },
    Completed {
        definition: QuizDefinition,
        outcome: AttemptOutcome,
    },
}

pub struct QuizSession {
    catalog: Vec<QuizDefinition>,
    phase: Phase,
    next_ticket: u64,
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            catalog: Vec::new(),
            phase: Phase::Idle,
            next_ticket: 0,
        }
    }

    // ===== Read access =====

    pub fn phase(&self) -> SessionPhase {
        match self.phase {
            Phase::Idle => SessionPhase::Idle,
            Phase::Loading { .. } => SessionPhase::Loading,
            Phase::InProgress { .. } => SessionPhase::InProgress,
            Phase::Completed { .. } => SessionPhase::Completed,
        }
    }

    pub fn catalog(&self) -> &[QuizDefinition] {
        &self.catalog
    }

    /// The quiz being taken or just finished.
    pub fn definition(&self) -> Option<&QuizDefinition> {
        match &self.phase {
            Phase::InProgress { definition, .. } | Phase::Completed { definition, .. } => {
                Some(definition)
            }
            _ => None,
        }
    }

    pub fn question_index(&self) -> Option<usize> {
        match &self.phase {
            Phase::InProgress { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match &self.phase {
            Phase::InProgress {
                definition, index, ..
            } => definition.questions.get(*index),
            _ => None,
        }
    }

    /// The answer picked for the question currently shown, if any.
    pub fn selected_answer(&self) -> Option<&str> {
        match &self.phase {
            Phase::InProgress {
                definition,
                index,
                answers,
                ..
            } => {
                let question = definition.questions.get(*index)?;
                answers.get(&question.id).map(String::as_str)
            }
            _ => None,
        }
    }

    pub fn answered_count(&self) -> usize {
        match &self.phase {
            Phase::InProgress { answers, .. } => answers.len(),
            _ => 0,
        }
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        match &self.phase {
            Phase::InProgress {
                remaining_seconds, ..
            } => Some(*remaining_seconds),
            _ => None,
        }
    }

    /// Position through the attempt for the progress bar, as a rounded
    /// percentage of questions reached.
    pub fn progress_percent(&self) -> Option<u32> {
        match &self.phase {
            Phase::InProgress {
                definition, index, ..
            } => {
                let total = definition.question_count().max(1);
                Some((((*index + 1) as f64 / total as f64) * 100.0).round() as u32)
            }
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&AttemptOutcome> {
        match &self.phase {
            Phase::Completed { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    // ===== Catalog loading =====

    /// Enter the loading phase and get the ticket the eventual result
    /// must present. Restarting a load supersedes the previous ticket.
    /// Ignored while an attempt is active.
    pub fn begin_loading(&mut self) -> Option<LoadTicket> {
        match self.phase {
            Phase::Idle | Phase::Loading { .. } => {
                self.next_ticket += 1;
                let ticket = LoadTicket(self.next_ticket);
                self.phase = Phase::Loading { ticket };
                Some(ticket)
            }
            _ => {
                debug!("Catalog load ignored during an active attempt");
                None
            }
        }
    }

    /// Install a load result. Malformed definitions are dropped; an empty
    /// result falls back to the built-in offline quiz. Results arriving
    /// with a superseded ticket are discarded.
    pub fn finish_loading(&mut self, ticket: LoadTicket, quizzes: Vec<QuizDefinition>) -> bool {
        match self.phase {
            Phase::Loading { ticket: current } if current == ticket => {
                self.install_catalog(quizzes);
                self.phase = Phase::Idle;
                true
            }
            _ => {
                debug!("Discarding superseded catalog load");
                false
            }
        }
    }

    /// Load the catalog through the fetch pipeline.
    ///
    /// Never fails: the routed request already falls back to cached or
    /// synthesized content, a non-OK response falls back to the last
    /// persisted list, and the built-in quiz is the final resort. A fresh
    /// list is persisted for the next offline launch.
    pub async fn load_catalog(
        &mut self,
        interceptor: &RequestInterceptor,
        tiers: &CacheTiers,
        backend: &impl FetchBackend,
        prefs: &LocalPrefs,
    ) -> SessionPhase {
        let Some(ticket) = self.begin_loading() else {
            return self.phase();
        };
        let quizzes = resolve_catalog(interceptor, tiers, backend, prefs).await;
        self.finish_loading(ticket, quizzes);
        self.phase()
    }

    fn install_catalog(&mut self, quizzes: Vec<QuizDefinition>) {
        let mut valid = Vec::with_capacity(quizzes.len());
        for quiz in quizzes {
            match quiz.validate() {
                Ok(()) => valid.push(quiz),
                Err(reason) => {
                    warn!(quiz_id = %quiz.id, reason, "Dropping malformed quiz definition")
                }
            }
        }
        if valid.is_empty() {
            debug!("No usable quiz definitions, falling back to built-in");
            valid.push(builtin_offline_quiz());
        }
        info!(count = valid.len(), "Quiz catalog loaded");
        self.catalog = valid;
    }

    // ===== Attempt lifecycle =====

    /// Start an attempt from the list. Only valid while idle; an unknown
    /// id is ignored.
    pub fn start(&mut self, quiz_id: &str) -> bool {
        if !matches!(self.phase, Phase::Idle) {
            debug!(quiz_id, "Start ignored outside the quiz list");
            return false;
        }
        let Some(definition) = self.catalog.iter().find(|q| q.id == quiz_id).cloned() else {
            warn!(quiz_id, "Unknown quiz id");
            return false;
        };
        let remaining_seconds = definition.time_limit_seconds();
        info!(
            quiz_id,
            questions = definition.question_count(),
            "Quiz attempt started"
        );
        self.phase = Phase::InProgress {
            definition,
            index: 0,
            answers: HashMap::new(),
            remaining_seconds,
        };
        true
    }

    /// Record an answer for the question currently shown. Re-selecting
    /// overwrites; the position does not advance.
    pub fn select_answer(&mut self, option: &str) -> bool {
        match &mut self.phase {
            Phase::InProgress {
                definition,
                index,
                answers,
                ..
            } => {
                let Some(question) = definition.questions.get(*index) else {
                    return false;
                };
                answers.insert(question.id, option.to_string());
                true
            }
            _ => false,
        }
    }

    /// Advance to the next question; a no-op on the last one.
    pub fn next_question(&mut self) -> bool {
        match &mut self.phase {
            Phase::InProgress {
                definition, index, ..
            } if *index + 1 < definition.questions.len() => {
                *index += 1;
                true
            }
            _ => false,
        }
    }

    /// Go back one question; a no-op on the first one.
    pub fn previous_question(&mut self) -> bool {
        match &mut self.phase {
            Phase::InProgress { index, .. } if *index > 0 => {
                *index -= 1;
                true
            }
            _ => false,
        }
    }

    /// One second of countdown. When the clock runs out the attempt is
    /// submitted with whatever answers exist at that instant. Returns
    /// true when this tick ended the attempt.
    pub fn tick(&mut self, outbox: &ResultOutbox, online: bool) -> bool {
        match &mut self.phase {
            Phase::InProgress {
                remaining_seconds, ..
            } => {
                if *remaining_seconds <= 1 {
                    *remaining_seconds = 0;
                    info!("Quiz time expired, submitting");
                    self.complete(outbox, online);
                    true
                } else {
                    *remaining_seconds -= 1;
                    false
                }
            }
            _ => false,
        }
    }

    /// Submit the attempt. Only valid while in progress, so a repeat
    /// submit (or one racing the timer) is ignored.
    pub fn submit(&mut self, outbox: &ResultOutbox, online: bool) -> Option<AttemptOutcome> {
        if !matches!(self.phase, Phase::InProgress { .. }) {
            debug!("Submit ignored outside an active attempt");
            return None;
        }
        self.complete(outbox, online)
    }

    /// Score the attempt, queue its record, and move to Completed.
    fn complete(&mut self, outbox: &ResultOutbox, online: bool) -> Option<AttemptOutcome> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::InProgress {
                definition,
                answers,
                remaining_seconds,
                ..
            } => {
                let time_taken = definition
                    .time_limit_seconds()
                    .saturating_sub(remaining_seconds);
                let record =
                    QuizAttemptRecord::from_session(&definition, answers, time_taken, !online);
                if let Err(e) = outbox.append(&record) {
                    warn!(id = %record.id, error = %e, "Failed to queue attempt for sync");
                }
                let outcome = AttemptOutcome {
                    score: record.score,
                    passed: record.passed,
                    record_id: record.id.clone(),
                };
                info!(
                    quiz_id = %record.quiz_id,
                    score = record.score,
                    passed = record.passed,
                    offline = record.offline,
                    "Quiz attempt completed"
                );
                self.phase = Phase::Completed {
                    definition,
                    outcome: outcome.clone(),
                };
                Some(outcome)
            }
            other => {
                self.phase = other;
                None
            }
        }
    }

    /// Take the same quiz again with a fresh clock and no answers.
    pub fn retry(&mut self) -> bool {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Completed { definition, .. } => {
                debug!(quiz_id = %definition.id, "Retrying quiz");
                let remaining_seconds = definition.time_limit_seconds();
                self.phase = Phase::InProgress {
                    definition,
                    index: 0,
                    answers: HashMap::new(),
                    remaining_seconds,
                };
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    /// Leave the results screen for the quiz list.
    pub fn back_to_list(&mut self) -> bool {
        if matches!(self.phase, Phase::Completed { .. }) {
            self.phase = Phase::Idle;
            true
        } else {
            false
        }
    }
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

async fn resolve_catalog(
    interceptor: &RequestInterceptor,
    tiers: &CacheTiers,
    backend: &impl FetchBackend,
    prefs: &LocalPrefs,
) -> Vec<QuizDefinition> {
    let request = RequestDescriptor::get(QUIZ_CATALOG_PATH);
    match interceptor.handle(&request, tiers, backend).await {
        Ok(snapshot) if snapshot.is_ok() => {
            match snapshot.json_body::<Vec<QuizDefinition>>() {
                Ok(quizzes) if !quizzes.is_empty() => {
                    if let Err(e) = prefs.set_offline_quizzes(&quizzes) {
                        warn!(error = %e, "Failed to persist quiz list for offline use");
                    }
                    return quizzes;
                }
                Ok(_) => debug!("Quiz endpoint returned an empty list"),
                Err(e) => warn!(error = %e, "Failed to parse quiz list"),
            }
        }
        Ok(snapshot) => debug!(status = snapshot.status, "Quiz endpoint unavailable"),
        Err(e) => debug!(error = %e, "Quiz catalog request failed"),
    }

    if let Some(saved) = prefs.offline_quizzes().filter(|q| !q.is_empty()) {
        debug!(count = saved.len(), "Using persisted offline quiz list");
        return saved;
    }
    vec![builtin_offline_quiz()]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseSnapshot;
    use crate::fetch::FetchError;

    struct FakeBackend {
        online: bool,
        responses: HashMap<String, ResponseSnapshot>,
    }

    impl FakeBackend {
        fn offline() -> Self {
            Self {
                online: false,
                responses: HashMap::new(),
            }
        }

        fn serving(path: &str, snapshot: ResponseSnapshot) -> Self {
            let mut responses = HashMap::new();
            responses.insert(path.to_string(), snapshot);
            Self {
                online: true,
                responses,
            }
        }
    }

    impl FetchBackend for FakeBackend {
        async fn fetch(&self, request: RequestDescriptor) -> Result<ResponseSnapshot, FetchError> {
            if !self.online {
                return Err(FetchError::Disconnected("network unreachable".to_string()));
            }
            self.responses
                .get(&request.path)
                .cloned()
                .ok_or_else(|| FetchError::Transport("no route".to_string()))
        }
    }

    fn outbox() -> (tempfile::TempDir, ResultOutbox) {
        let dir = tempfile::tempdir().expect("tempdir");
        let outbox = ResultOutbox::new(dir.path().to_path_buf()).expect("outbox");
        (dir, outbox)
    }

    fn mini_quiz() -> QuizDefinition {
        QuizDefinition {
            id: "mini".to_string(),
            course_type: None,
            title: "Mini".to_string(),
            description: String::new(),
            difficulty: None,
            questions: vec![
                QuizQuestion {
                    id: 1,
                    prompt: "First?".to_string(),
                    options: vec!["a".to_string(), "b".to_string()],
                    correct_answer: "a".to_string(),
                    explanation: None,
                },
                QuizQuestion {
                    id: 2,
                    prompt: "Second?".to_string(),
                    options: vec!["a".to_string(), "b".to_string()],
                    correct_answer: "b".to_string(),
                    explanation: None,
                },
            ],
            passing_score: 70,
            time_limit_minutes: 1,
            offline: false,
        }
    }

    fn session_with(quizzes: Vec<QuizDefinition>) -> QuizSession {
        let mut session = QuizSession::new();
        let ticket = session.begin_loading().expect("loading from idle");
        assert!(session.finish_loading(ticket, quizzes));
        session
    }

    #[test]
    fn test_start_enters_attempt_with_full_clock() {
        let mut session = session_with(vec![builtin_offline_quiz()]);
        assert!(session.start("offline-quiz-1"));

        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.question_index(), Some(0));
        assert_eq!(session.remaining_seconds(), Some(15 * 60));
        assert_eq!(session.progress_percent(), Some(33));
        assert_eq!(session.answered_count(), 0);
    }

    #[test]
    fn test_start_unknown_id_is_ignored() {
        let mut session = session_with(vec![builtin_offline_quiz()]);
        assert!(!session.start("no-such-quiz"));
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_start_requires_idle() {
        let mut session = session_with(vec![builtin_offline_quiz()]);
        assert!(session.start("offline-quiz-1"));
        assert!(!session.start("offline-quiz-1"));
    }

    #[test]
    fn test_select_answer_overwrites_without_advancing() {
        let mut session = session_with(vec![mini_quiz()]);
        session.start("mini");

        assert!(session.select_answer("a"));
        assert_eq!(session.selected_answer(), Some("a"));
        assert!(session.select_answer("b"));
        assert_eq!(session.selected_answer(), Some("b"));
        assert_eq!(session.question_index(), Some(0));
        assert_eq!(session.answered_count(), 1);
    }

    #[test]
    fn test_navigation_is_bounded() {
        let mut session = session_with(vec![mini_quiz()]);
        session.start("mini");

        assert!(!session.previous_question());
        assert_eq!(session.question_index(), Some(0));

        assert!(session.next_question());
        assert_eq!(session.question_index(), Some(1));
        assert_eq!(session.progress_percent(), Some(100));

        assert!(!session.next_question());
        assert_eq!(session.question_index(), Some(1));

        assert!(session.previous_question());
        assert_eq!(session.question_index(), Some(0));
    }

    #[test]
    fn test_answers_follow_the_shown_question() {
        let mut session = session_with(vec![mini_quiz()]);
        session.start("mini");

        session.select_answer("a");
        session.next_question();
        assert_eq!(session.selected_answer(), None);
        session.select_answer("b");
        session.previous_question();
        assert_eq!(session.selected_answer(), Some("a"));
        assert_eq!(session.answered_count(), 2);
    }

    #[test]
    fn test_countdown_expiry_forces_completion() {
        let (_dir, outbox) = outbox();
        let mut session = session_with(vec![mini_quiz()]);
        session.start("mini");
        session.select_answer("a");

        let mut completed_on_tick = false;
        for _ in 0..60 {
            if session.tick(&outbox, false) {
                completed_on_tick = true;
                break;
            }
        }

        assert!(completed_on_tick, "one minute of ticks must expire the clock");
        assert_eq!(session.phase(), SessionPhase::Completed);

        // Scored with the answers held at expiry: one of two correct.
        let outcome = session.outcome().expect("outcome present");
        assert_eq!(outcome.score, 50);
        assert!(!outcome.passed);

        let records = outbox.list().expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].time_taken, 60);
        assert!(records[0].offline);
    }

    #[test]
    fn test_submit_scores_two_of_three_as_sixty_seven() {
        let (_dir, outbox) = outbox();
        let mut session = session_with(vec![builtin_offline_quiz()]);
        session.start("offline-quiz-1");

        session.select_answer("General Warning");
        session.next_question();
        session.select_answer("50 km/h");
        session.next_question();
        session.select_answer("Never");

        let outcome = session.submit(&outbox, true).expect("outcome");
        assert_eq!(outcome.score, 67);
        assert!(!outcome.passed);

        let records = outbox.list().expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quiz_id, "offline-quiz-1");
        assert!(!records[0].offline);
    }

    #[test]
    fn test_unanswered_questions_count_as_incorrect() {
        let (_dir, outbox) = outbox();
        let mut session = session_with(vec![builtin_offline_quiz()]);
        session.start("offline-quiz-1");

        let outcome = session.submit(&outbox, true).expect("outcome");
        assert_eq!(outcome.score, 0);
        assert!(!outcome.passed);
    }

    #[test]
    fn test_completion_is_recorded_exactly_once() {
        let (_dir, outbox) = outbox();
        let mut session = session_with(vec![mini_quiz()]);
        session.start("mini");

        assert!(session.submit(&outbox, true).is_some());
        assert!(session.submit(&outbox, true).is_none());
        assert!(!session.tick(&outbox, true));
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn test_retry_resets_clock_and_answers() {
        let (_dir, outbox) = outbox();
        let mut session = session_with(vec![mini_quiz()]);
        session.start("mini");
        session.select_answer("a");
        session.next_question();
        session.tick(&outbox, true);
        session.submit(&outbox, true);

        assert!(session.retry());
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.question_index(), Some(0));
        assert_eq!(session.answered_count(), 0);
        assert_eq!(session.remaining_seconds(), Some(60));
    }

    #[test]
    fn test_back_to_list_keeps_catalog() {
        let (_dir, outbox) = outbox();
        let mut session = session_with(vec![mini_quiz(), builtin_offline_quiz()]);
        session.start("mini");
        session.submit(&outbox, true);

        assert!(session.back_to_list());
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.catalog().len(), 2);
        assert!(!session.back_to_list());
    }

    #[test]
    fn test_superseded_load_ticket_is_discarded() {
        let mut session = QuizSession::new();
        let stale = session.begin_loading().expect("first load");
        let fresh = session.begin_loading().expect("restarted load");

        assert!(!session.finish_loading(stale, vec![mini_quiz()]));
        assert_eq!(session.phase(), SessionPhase::Loading);

        assert!(session.finish_loading(fresh, vec![builtin_offline_quiz()]));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.catalog()[0].id, "offline-quiz-1");
    }

    #[test]
    fn test_empty_load_falls_back_to_builtin() {
        let session = session_with(Vec::new());
        assert_eq!(session.catalog().len(), 1);
        assert_eq!(session.catalog()[0].id, "offline-quiz-1");
    }

    #[test]
    fn test_malformed_definitions_are_dropped() {
        let mut broken = mini_quiz();
        broken.id = "broken".to_string();
        broken.questions[0].correct_answer = "not an option".to_string();

        let session = session_with(vec![broken, mini_quiz()]);
        assert_eq!(session.catalog().len(), 1);
        assert_eq!(session.catalog()[0].id, "mini");
    }

    #[tokio::test]
    async fn test_load_catalog_online_installs_and_persists() {
        let cache_dir = tempfile::tempdir().expect("tempdir");
        let prefs_dir = tempfile::tempdir().expect("tempdir");
        let tiers = CacheTiers::new(cache_dir.path().to_path_buf()).expect("tiers");
        let prefs = LocalPrefs::new(prefs_dir.path().to_path_buf()).expect("prefs");
        let backend = FakeBackend::serving(
            QUIZ_CATALOG_PATH,
            ResponseSnapshot::json(200, &vec![mini_quiz()]),
        );

        let mut session = QuizSession::new();
        let phase = session
            .load_catalog(&RequestInterceptor::new(), &tiers, &backend, &prefs)
            .await;

        assert_eq!(phase, SessionPhase::Idle);
        assert_eq!(session.catalog().len(), 1);
        assert_eq!(session.catalog()[0].id, "mini");

        let saved = prefs.offline_quizzes().expect("persisted for offline");
        assert_eq!(saved[0].id, "mini");
    }

    #[tokio::test]
    async fn test_load_catalog_offline_synthesizes_builtin() {
        let cache_dir = tempfile::tempdir().expect("tempdir");
        let prefs_dir = tempfile::tempdir().expect("tempdir");
        let tiers = CacheTiers::new(cache_dir.path().to_path_buf()).expect("tiers");
        let prefs = LocalPrefs::new(prefs_dir.path().to_path_buf()).expect("prefs");

        let mut session = QuizSession::new();
        let phase = session
            .load_catalog(
                &RequestInterceptor::new(),
                &tiers,
                &FakeBackend::offline(),
                &prefs,
            )
            .await;

        assert_eq!(phase, SessionPhase::Idle);
        assert_eq!(session.catalog().len(), 1);
        assert_eq!(session.catalog()[0].id, "offline-quiz-1");
        assert!(session.catalog()[0].offline);
    }

    #[tokio::test]
    async fn test_load_catalog_server_error_uses_saved_list() {
        let cache_dir = tempfile::tempdir().expect("tempdir");
        let prefs_dir = tempfile::tempdir().expect("tempdir");
        let tiers = CacheTiers::new(cache_dir.path().to_path_buf()).expect("tiers");
        let prefs = LocalPrefs::new(prefs_dir.path().to_path_buf()).expect("prefs");
        prefs.set_offline_quizzes(&[mini_quiz()]).expect("seed prefs");

        // The server answers, but with an error status: no cached copy to
        // fall back to, so the persisted list wins.
        let backend = FakeBackend::serving(
            QUIZ_CATALOG_PATH,
            ResponseSnapshot::json(500, &serde_json::json!({"detail": "boom"})),
        );

        let mut session = QuizSession::new();
        session
            .load_catalog(&RequestInterceptor::new(), &tiers, &backend, &prefs)
            .await;

        assert_eq!(session.catalog().len(), 1);
        assert_eq!(session.catalog()[0].id, "mini");
    }

    #[tokio::test]
    async fn test_load_catalog_ignored_during_attempt() {
        let cache_dir = tempfile::tempdir().expect("tempdir");
        let prefs_dir = tempfile::tempdir().expect("tempdir");
        let tiers = CacheTiers::new(cache_dir.path().to_path_buf()).expect("tiers");
        let prefs = LocalPrefs::new(prefs_dir.path().to_path_buf()).expect("prefs");

        let mut session = session_with(vec![mini_quiz()]);
        session.start("mini");

        let phase = session
            .load_catalog(
                &RequestInterceptor::new(),
                &tiers,
                &FakeBackend::offline(),
                &prefs,
            )
            .await;

        assert_eq!(phase, SessionPhase::InProgress);
        assert_eq!(session.catalog()[0].id, "mini");
    }
}
