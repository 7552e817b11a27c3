//! Quiz Attempt Lifecycle
//!
//! Domain types for a single timed attempt plus the three pieces that drive
//! it:
//! - [`timer::Countdown`] - one-second countdown with a single expiry
//! - [`responses::ResponseSet`] - question → selected answers
//! - [`controller::AttemptController`] - the attempt state machine

pub mod controller;
pub mod responses;
pub mod timer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type QuizId = u64;
pub type AttemptId = u64;
pub type QuestionId = u64;
pub type AnswerId = u64;
pub type CourseId = u64;

pub use controller::{AttemptController, AttemptState, AttemptUpdate};
pub use responses::{AnswerRecord, ResponseSet, SubmitQuizRequest};
pub use timer::Countdown;

/// One user's allocated attempt at a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    pub attempt_id: AttemptId,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub started_at: DateTime<Utc>,
    pub time_limit_seconds: u64,
}

/// Question kinds the backend knows about. Both resolve to a single
/// selected answer in the attempt flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    SingleChoice,
    TrueFalse,
}

impl QuestionType {
    /// Map the backend's numeric wire code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(QuestionType::SingleChoice),
            1 => Some(QuestionType::TrueFalse),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::SingleChoice => write!(f, "single choice"),
            QuestionType::TrueFalse => write!(f, "true/false"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    pub id: AnswerId,
    pub text: String,
    pub order_index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub question_type: QuestionType,
    pub order_index: i64,
    pub answers: Vec<AnswerOption>,
}

impl Question {
    pub fn has_answer(&self, answer_id: AnswerId) -> bool {
        self.answers.iter().any(|a| a.id == answer_id)
    }
}

/// Terminal outcome of a submitted attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitResult {
    pub attempt_id: AttemptId,
    pub quiz_id: QuizId,
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub is_passed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}
