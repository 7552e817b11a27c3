use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ApiError;
use crate::quiz::{
    AnswerId, AnswerOption, AttemptId, CourseId, Question, QuestionId, QuestionType, QuizAttempt,
    QuizId, SubmitResult,
};

pub use crate::quiz::{AnswerRecord, SubmitQuizRequest};

/// Wrapper every backend response arrives in.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

impl<T> Envelope<T> {
    /// Unwrap `data`, treating `success: false` or a missing payload as a
    /// rejection.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(self.rejection());
        }
        match self.data {
            Some(data) => Ok(data),
            None => Err(self.rejection()),
        }
    }

    fn rejection(&self) -> ApiError {
        ApiError::Rejected(self.failure_message())
    }

    fn failure_message(&self) -> String {
        if let Some(msg) = self.message.as_deref().filter(|m| !m.trim().is_empty()) {
            return msg.to_string();
        }
        match self.errors.as_deref() {
            Some(errors) if !errors.is_empty() => errors.join(", "),
            _ => "The server returned no data".to_string(),
        }
    }
}

impl<T> Envelope<Vec<T>> {
    /// Unwrap a list payload. A successful response without `data` is an
    /// empty list.
    pub fn into_list(self) -> Result<Vec<T>, ApiError> {
        if !self.success {
            return Err(self.rejection());
        }
        Ok(self.data.unwrap_or_default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAnswerDto {
    pub id: AnswerId,
    pub answer_text: String,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQuestionDto {
    pub id: QuestionId,
    pub question_text: String,
    pub question_type: i64,
    pub order_index: i64,
    pub answers: Vec<StartAnswerDto>,
}

/// Payload of `POST /Quizzes/{quizId}/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQuizData {
    pub attempt_id: AttemptId,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    /// Minutes.
    pub time_limit: i64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub started_at: DateTime<Utc>,
    pub questions: Vec<StartQuestionDto>,
}

impl StartQuizData {
    /// Validate and convert into domain types.
    ///
    /// Questions and their answers come back sorted by `order_index`.
    pub fn into_attempt(self) -> Result<(QuizAttempt, Vec<Question>), ApiError> {
        if self.attempt_id == 0 {
            return Err(ApiError::Validation("attempt id must be non-zero".to_string()));
        }
        if self.time_limit <= 0 {
            return Err(ApiError::Validation(format!(
                "time limit must be positive, got {} minutes",
                self.time_limit
            )));
        }
        if self.questions.is_empty() {
            return Err(ApiError::Validation(format!(
                "quiz {} has no questions",
                self.quiz_id
            )));
        }

        let mut seen = HashSet::new();
        let mut questions = Vec::with_capacity(self.questions.len());
        for dto in self.questions {
            if !seen.insert(dto.id) {
                return Err(ApiError::Validation(format!(
                    "duplicate question id {}",
                    dto.id
                )));
            }
            let question_type = QuestionType::from_code(dto.question_type).ok_or_else(|| {
                ApiError::Validation(format!(
                    "question {} has unknown type {}",
                    dto.id, dto.question_type
                ))
            })?;
            if dto.answers.is_empty() {
                return Err(ApiError::Validation(format!(
                    "question {} has no answer options",
                    dto.id
                )));
            }

            let mut answers: Vec<AnswerOption> = dto
                .answers
                .into_iter()
                .map(|a| AnswerOption {
                    id: a.id,
                    text: a.answer_text,
                    order_index: a.order_index,
                })
                .collect();
            answers.sort_by_key(|a| a.order_index);

            questions.push(Question {
                id: dto.id,
                text: dto.question_text,
                question_type,
                order_index: dto.order_index,
                answers,
            });
        }
        questions.sort_by_key(|q| q.order_index);

        let attempt = QuizAttempt {
            attempt_id: self.attempt_id,
            quiz_id: self.quiz_id,
            quiz_title: self.quiz_title,
            started_at: self.started_at,
            time_limit_seconds: (self.time_limit as u64).saturating_mul(60),
        };

        Ok((attempt, questions))
    }
}

/// Payload of `POST /Quizzes/{quizId}/submit` and of the history endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizResult {
    pub id: AttemptId,
    pub user_id: u64,
    #[serde(default)]
    pub user_full_name: Option<String>,
    pub quiz_id: QuizId,
    #[serde(default)]
    pub quiz_title: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub is_passed: bool,
}

impl SubmitQuizResult {
    pub fn into_result(self) -> Result<SubmitResult, ApiError> {
        if self.correct_answers > self.total_questions {
            return Err(ApiError::Validation(format!(
                "{} correct answers out of {} questions",
                self.correct_answers, self.total_questions
            )));
        }
        if !self.score.is_finite() {
            return Err(ApiError::Validation("score is not a number".to_string()));
        }
        Ok(SubmitResult {
            attempt_id: self.id,
            quiz_id: self.quiz_id,
            score: self.score,
            correct_answers: self.correct_answers,
            total_questions: self.total_questions,
            is_passed: self.is_passed,
            completed_at: self.completed_at,
        })
    }
}

/// Entry of `GET /Quizzes/courses/{courseId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: QuizId,
    pub course_id: CourseId,
    pub quiz_title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub total_questions: u32,
    pub passing_score: f64,
    /// Minutes.
    pub time_limit: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: u64,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: UserDto,
}

/// Accepts RFC 3339 or a zone-less ISO timestamp, read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw))),
    }
}
