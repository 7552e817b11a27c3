//! Result Presenter
//!
//! Turns attempt state into terminal text. Everything here returns a
//! `String`; printing is left to the CLI.

use colored::*;

use crate::api::types::{QuizSummary, SubmitQuizResult};
use crate::quiz::{AnswerId, CourseId, Question, QuizAttempt, QuizId, SubmitResult};

/// `m:ss`, as shown next to the countdown.
pub fn format_time(total_secs: u64) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Whether a countdown value is worth printing. Every minute, then every
/// ten seconds in the last minute, then every second in the last ten.
pub fn should_announce(remaining_secs: u64) -> bool {
    match remaining_secs {
        0 => false,
        1..=10 => true,
        11..=60 => remaining_secs % 10 == 0,
        _ => remaining_secs % 60 == 0,
    }
}

pub fn render_header(attempt: &QuizAttempt, question_count: usize) -> String {
    format!(
        "{}\n{} questions · time limit {}\n",
        attempt.quiz_title.bold(),
        question_count,
        format_time(attempt.time_limit_seconds)
    )
}

/// One question with numbered options. Selected options are marked.
pub fn render_question(number: usize, question: &Question, selected: &[AnswerId]) -> String {
    let mut out = format!(
        "{} {} {}\n",
        format!("Q{}.", number).bold(),
        question.text,
        format!("({})", question.question_type).dimmed()
    );
    for (i, answer) in question.answers.iter().enumerate() {
        let marker = if selected.contains(&answer.id) {
            "[x]".green().to_string()
        } else {
            "[ ]".to_string()
        };
        out.push_str(&format!("   {} {}. {}\n", marker, i + 1, answer.text));
    }
    out
}

pub fn render_countdown(remaining_secs: u64) -> String {
    let text = format!("⏱  {} left", format_time(remaining_secs));
    if remaining_secs <= 10 {
        text.red().bold().to_string()
    } else if remaining_secs <= 60 {
        text.yellow().to_string()
    } else {
        text.dimmed().to_string()
    }
}

pub fn render_result(result: &SubmitResult) -> String {
    let verdict = if result.is_passed {
        "PASSED".green().bold()
    } else {
        "FAILED".red().bold()
    };
    format!(
        "{}\nScore: {:.1}%  ({}/{} correct)\n",
        verdict, result.score, result.correct_answers, result.total_questions
    )
}

pub fn render_history(entries: &[SubmitQuizResult]) -> String {
    if entries.is_empty() {
        return "No quiz attempts yet.\n".dimmed().to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let title = entry
            .quiz_title
            .clone()
            .unwrap_or_else(|| format!("Quiz {}", entry.quiz_id));
        let verdict = if entry.is_passed {
            "passed".green()
        } else {
            "failed".red()
        };
        let when = entry
            .completed_at
            .unwrap_or(entry.started_at)
            .format("%Y-%m-%d %H:%M");
        out.push_str(&format!(
            "{}  {:<30} {:>5.1}%  {}/{}  {}\n",
            when, title, entry.score, entry.correct_answers, entry.total_questions, verdict
        ));
    }
    out
}

/// Course quiz list. `is_passed` marks quizzes recorded as passed.
pub fn render_quizzes<F>(course_id: CourseId, quizzes: &[QuizSummary], is_passed: F) -> String
where
    F: Fn(QuizId) -> bool,
{
    if quizzes.is_empty() {
        return format!("Course {} has no quizzes.\n", course_id)
            .dimmed()
            .to_string();
    }
    let mut out = format!("{}\n", format!("Quizzes for course {}", course_id).bold());
    for quiz in quizzes {
        let status = if is_passed(quiz.id) {
            "✓".green().to_string()
        } else if !quiz.is_active {
            "inactive".dimmed().to_string()
        } else {
            String::new()
        };
        out.push_str(&format!(
            "  #{:<5} {:<30} {} questions, {} min, pass at {}%  {}\n",
            quiz.id,
            quiz.quiz_title,
            quiz.total_questions,
            quiz.time_limit,
            quiz.passing_score,
            status
        ));
    }
    out
}

pub fn render_progress(course_id: CourseId, passed: &[QuizId]) -> String {
    if passed.is_empty() {
        return format!("No passed quizzes recorded for course {}.\n", course_id);
    }
    let ids: Vec<String> = passed.iter().map(|id| format!("#{}", id)).collect();
    format!(
        "Course {}: {} passed quiz(zes): {}\n",
        course_id,
        passed.len(),
        ids.join(", ")
    )
}

pub fn render_error(message: &str) -> String {
    format!("{} {}", "✗".red().bold(), message)
}

pub fn render_notice(message: &str) -> String {
    format!("{} {}", "!".yellow().bold(), message)
}
