//! Answer collection for an in-progress attempt.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{AnswerId, AttemptId, Question, QuestionId};

/// One question's entry in the submit payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub selected_answer_ids: Vec<AnswerId>,
}

/// Body of `POST /Quizzes/{quizId}/submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    pub attempt_id: AttemptId,
    pub answers: Vec<AnswerRecord>,
}

/// Current selection per question.
///
/// Selections keep the order in which ids were added. The set does not know
/// about question types; callers pick `set_answer` or `toggle_answer`.
#[derive(Debug, Clone, Default)]
pub struct ResponseSet {
    selections: HashMap<QuestionId, Vec<AnswerId>>,
}

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Radio semantics: replaces whatever was selected before.
    pub fn set_answer(&mut self, question_id: QuestionId, answer_id: AnswerId) {
        self.selections.insert(question_id, vec![answer_id]);
    }

    /// Checkbox semantics: add if absent, remove if present.
    pub fn toggle_answer(&mut self, question_id: QuestionId, answer_id: AnswerId) {
        let selected = self.selections.entry(question_id).or_default();
        if let Some(pos) = selected.iter().position(|&id| id == answer_id) {
            selected.remove(pos);
        } else {
            selected.push(answer_id);
        }
        if selected.is_empty() {
            self.selections.remove(&question_id);
        }
    }

    pub fn clear(&mut self, question_id: QuestionId) {
        self.selections.remove(&question_id);
    }

    pub fn selected(&self, question_id: QuestionId) -> &[AnswerId] {
        self.selections
            .get(&question_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of questions with at least one selection.
    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Build the submit payload.
    ///
    /// Emits one record per entry of `questions`, in that order, whether or
    /// not it was answered. Selections for ids outside `questions` are left
    /// out.
    pub fn to_submission(&self, attempt_id: AttemptId, questions: &[Question]) -> SubmitQuizRequest {
        let answers = questions
            .iter()
            .map(|q| AnswerRecord {
                question_id: q.id,
                selected_answer_ids: self.selected(q.id).to_vec(),
            })
            .collect();

        SubmitQuizRequest {
            attempt_id,
            answers,
        }
    }
}
