use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{read_json, write_json_atomic};
use crate::errors::StorageError;
use crate::quiz::{CourseId, QuizId};

pub const PROGRESS_FILE: &str = "progress.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseProgress {
    #[serde(default)]
    pub passed_quizzes: Vec<QuizId>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressFile {
    #[serde(default)]
    courses: BTreeMap<String, CourseProgress>,
}

/// Passed quizzes per user and course.
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    data: ProgressFile,
}

impl ProgressStore {
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        let path = dir.join(PROGRESS_FILE);
        let data = read_json(&path)?.unwrap_or_default();
        Ok(Self { path, data })
    }

    /// `user_id` 0 stands for "not logged in".
    pub fn key(user_id: u64, course_id: CourseId) -> String {
        format!("user_{}_course_{}", user_id, course_id)
    }

    pub fn course(&self, user_id: u64, course_id: CourseId) -> CourseProgress {
        self.data
            .courses
            .get(&Self::key(user_id, course_id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_passed(&self, user_id: u64, course_id: CourseId, quiz_id: QuizId) -> bool {
        self.data
            .courses
            .get(&Self::key(user_id, course_id))
            .is_some_and(|c| c.passed_quizzes.contains(&quiz_id))
    }

    /// Record a passed quiz. Returns `false` if it was already recorded, in
    /// which case nothing is written.
    pub fn mark_passed(
        &mut self,
        user_id: u64,
        course_id: CourseId,
        quiz_id: QuizId,
    ) -> Result<bool, StorageError> {
        let entry = self
            .data
            .courses
            .entry(Self::key(user_id, course_id))
            .or_default();
        if entry.passed_quizzes.contains(&quiz_id) {
            return Ok(false);
        }
        entry.passed_quizzes.push(quiz_id);
        write_json_atomic(&self.path, &self.data)?;
        debug!(
            "Recorded quiz {} as passed for course {}",
            quiz_id, course_id
        );
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
