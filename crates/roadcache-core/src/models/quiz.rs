use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single multiple-choice question within a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: u32,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}

/// A theory quiz as served by the API or synthesized for offline use.
/// Immutable once handed to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDefinition {
    pub id: String,
    /// Course the quiz belongs to ("theory", "park"). Absent on the
    /// built-in offline definition.
    #[serde(default)]
    pub course_type: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    pub questions: Vec<QuizQuestion>,
    pub passing_score: u32,
    pub time_limit_minutes: u32,
    /// Marks built-in definitions that only exist for offline practice.
    #[serde(default)]
    pub offline: bool,
}

impl QuizDefinition {
    /// Check the structural invariants: every question has at least two
    /// distinct options and its correct answer is one of them.
    pub fn validate(&self) -> Result<(), String> {
        for question in &self.questions {
            if question.options.len() < 2 {
                return Err(format!(
                    "question {} has fewer than two options",
                    question.id
                ));
            }
            for (i, option) in question.options.iter().enumerate() {
                if question.options[..i].contains(option) {
                    return Err(format!(
                        "question {} has duplicate option '{}'",
                        question.id, option
                    ));
                }
            }
            if !question.options.contains(&question.correct_answer) {
                return Err(format!(
                    "question {} correct answer '{}' is not among its options",
                    question.id, question.correct_answer
                ));
            }
        }
        let mut seen = Vec::with_capacity(self.questions.len());
        for question in &self.questions {
            if seen.contains(&question.id) {
                return Err(format!("duplicate question id {}", question.id));
            }
            seen.push(question.id);
        }
        Ok(())
    }

    /// Percentage score for an answer mapping, rounded to the nearest
    /// integer. Unanswered questions count as incorrect. A definition
    /// with no questions scores 0.
    pub fn score_percent(&self, answers: &HashMap<u32, String>) -> u32 {
        if self.questions.is_empty() {
            return 0;
        }
        let correct = self
            .questions
            .iter()
            .filter(|q| answers.get(&q.id).is_some_and(|a| q.is_correct(a)))
            .count();
        ((correct as f64 / self.questions.len() as f64) * 100.0).round() as u32
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn time_limit_seconds(&self) -> u32 {
        self.time_limit_minutes * 60
    }
}

/// The one quiz that is always available without a network connection.
/// Returned by the offline fallback for the quiz-content endpoint and used
/// as the last resort when a session has nothing cached.
pub fn builtin_offline_quiz() -> QuizDefinition {
    QuizDefinition {
        id: "offline-quiz-1".to_string(),
        course_type: None,
        title: "Road Signs Quiz (Offline)".to_string(),
        description: "Practice road signs offline".to_string(),
        difficulty: Some("medium".to_string()),
        questions: vec![
            QuizQuestion {
                id: 1,
                prompt: "What does a red triangle sign with an exclamation mark mean?"
                    .to_string(),
                options: vec![
                    "Stop".to_string(),
                    "General Warning".to_string(),
                    "No Entry".to_string(),
                    "Speed Limit".to_string(),
                ],
                correct_answer: "General Warning".to_string(),
                explanation: Some(
                    "A red triangle with exclamation mark indicates a general warning to drivers."
                        .to_string(),
                ),
            },
            QuizQuestion {
                id: 2,
                prompt: "What is the speed limit in urban areas in Algeria?".to_string(),
                options: vec![
                    "40 km/h".to_string(),
                    "50 km/h".to_string(),
                    "60 km/h".to_string(),
                    "70 km/h".to_string(),
                ],
                correct_answer: "50 km/h".to_string(),
                explanation: Some(
                    "The speed limit in urban areas in Algeria is 50 km/h unless otherwise indicated."
                        .to_string(),
                ),
            },
            QuizQuestion {
                id: 3,
                prompt: "When should you use your headlights during the day?".to_string(),
                options: vec![
                    "Never".to_string(),
                    "Only when raining".to_string(),
                    "Outside urban areas".to_string(),
                    "Always".to_string(),
                ],
                correct_answer: "Outside urban areas".to_string(),
                explanation: Some(
                    "In Algeria, headlights must be used during the day when driving outside urban areas."
                        .to_string(),
                ),
            },
        ],
        passing_score: 70,
        time_limit_minutes: 15,
        offline: true,
    }
}
