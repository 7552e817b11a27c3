//! Attempt Controller
//!
//! Drives one timed attempt through
//! `Loading → Ready → Submitting → Completed | Failed`.
//!
//! The controller is owned by a single driver task. Timer ticks, timer
//! expiry and submit completions are queued on one channel and applied one
//! at a time through [`AttemptController::next_update`], so the response
//! set is never touched concurrently. The submit request itself runs on a
//! spawned task, which keeps the countdown ticking while it is in flight.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::responses::ResponseSet;
use super::timer::Countdown;
use super::{AnswerId, Question, QuestionId, QuizAttempt, QuizId, SubmitResult};
use crate::api::types::SubmitQuizResult;
use crate::api::QuizBackend;
use crate::errors::{ApiError, AttemptError};

/// An attempt that is being answered. Owns the countdown and the
/// responses, so both go away together.
#[derive(Debug)]
pub struct ActiveAttempt {
    attempt: QuizAttempt,
    questions: Vec<Question>,
    responses: ResponseSet,
    timer: Countdown,
    expired: bool,
}

impl ActiveAttempt {
    pub fn attempt(&self) -> &QuizAttempt {
        &self.attempt
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn responses(&self) -> &ResponseSet {
        &self.responses
    }

    pub fn remaining_secs(&self) -> u64 {
        self.timer.remaining_secs()
    }

    /// Whether the time limit has run out.
    pub fn expired(&self) -> bool {
        self.expired
    }

    fn check_answer(&self, question_id: QuestionId, answer_id: AnswerId) -> Result<(), AttemptError> {
        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or(AttemptError::UnknownQuestion { question_id })?;
        if !question.has_answer(answer_id) {
            return Err(AttemptError::UnknownAnswer {
                question_id,
                answer_id,
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum AttemptState {
    Loading,
    Ready(ActiveAttempt),
    Submitting(ActiveAttempt),
    Completed {
        attempt: QuizAttempt,
        result: SubmitResult,
    },
    Failed {
        message: String,
    },
}

impl AttemptState {
    pub fn name(&self) -> &'static str {
        match self {
            AttemptState::Loading => "loading",
            AttemptState::Ready(_) => "ready",
            AttemptState::Submitting(_) => "submitting",
            AttemptState::Completed { .. } => "completed",
            AttemptState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptState::Completed { .. } | AttemptState::Failed { .. }
        )
    }
}

/// Something the presenter should show.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptUpdate {
    Tick { remaining_secs: u64 },
    /// Time ran out and the answers were sent automatically.
    AutoSubmitted,
    /// Time ran out while a submission was already in flight.
    ExpiredWhileSubmitting,
    Completed(SubmitResult),
    /// The submission was rejected; the attempt is `Ready` again.
    SubmitFailed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitTrigger {
    Manual,
    Timer,
}

#[derive(Debug)]
enum AttemptEvent {
    Tick(u64),
    Expired,
    Submitted(Result<SubmitQuizResult, ApiError>),
}

pub struct AttemptController {
    backend: Arc<dyn QuizBackend>,
    quiz_id: QuizId,
    state: AttemptState,
    events_tx: mpsc::UnboundedSender<AttemptEvent>,
    events_rx: mpsc::UnboundedReceiver<AttemptEvent>,
}

impl std::fmt::Debug for AttemptController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttemptController")
            .field("quiz_id", &self.quiz_id)
            .field("state", &self.state.name())
            .finish()
    }
}

impl AttemptController {
    pub fn new(backend: Arc<dyn QuizBackend>, quiz_id: QuizId) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            quiz_id,
            state: AttemptState::Loading,
            events_tx,
            events_rx,
        }
    }

    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    /// The attempt being answered, in `Ready` or `Submitting`.
    pub fn active(&self) -> Option<&ActiveAttempt> {
        match &self.state {
            AttemptState::Ready(active) | AttemptState::Submitting(active) => Some(active),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&SubmitResult> {
        match &self.state {
            AttemptState::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Start the attempt on the backend and begin the countdown.
    ///
    /// Any failure leaves the controller in `Failed`; a new controller is
    /// needed to try again.
    pub async fn load(&mut self) -> Result<(), AttemptError> {
        if !matches!(self.state, AttemptState::Loading) {
            return Err(AttemptError::AlreadyStarted {
                state: self.state.name(),
            });
        }
        if self.quiz_id == 0 {
            let err = AttemptError::InvalidQuizId;
            warn!("Refusing to start quiz: {}", err);
            self.state = AttemptState::Failed {
                message: err.to_string(),
            };
            return Err(err);
        }

        info!("Starting quiz {}", self.quiz_id);
        let quiz_id = self.quiz_id;
        let loaded = self
            .backend
            .start_quiz(quiz_id)
            .await
            .and_then(|data| {
                if data.quiz_id != quiz_id {
                    return Err(ApiError::Validation(format!(
                        "asked for quiz {} but the server started quiz {}",
                        quiz_id, data.quiz_id
                    )));
                }
                data.into_attempt()
            });

        match loaded {
            Ok((attempt, questions)) => self.activate(attempt, questions),
            Err(e) => {
                let message = load_failure_message(&e);
                warn!("Failed to start quiz {}: {}", quiz_id, e);
                self.state = AttemptState::Failed { message };
                Err(AttemptError::Load(e))
            }
        }
    }

    /// Enter `Ready` with an attempt that is already allocated and start
    /// its countdown. Must be called inside a tokio runtime.
    pub fn activate(
        &mut self,
        attempt: QuizAttempt,
        questions: Vec<Question>,
    ) -> Result<(), AttemptError> {
        if !matches!(self.state, AttemptState::Loading) {
            return Err(AttemptError::AlreadyStarted {
                state: self.state.name(),
            });
        }

        let tick_tx = self.events_tx.clone();
        let expire_tx = self.events_tx.clone();
        let timer = Countdown::start(
            attempt.time_limit_seconds,
            move |left| {
                let _ = tick_tx.send(AttemptEvent::Tick(left));
            },
            move || {
                let _ = expire_tx.send(AttemptEvent::Expired);
            },
        );

        info!(
            "Attempt {} ready: {} questions, {}s",
            attempt.attempt_id,
            questions.len(),
            attempt.time_limit_seconds
        );
        self.state = AttemptState::Ready(ActiveAttempt {
            attempt,
            questions,
            responses: ResponseSet::new(),
            timer,
            expired: false,
        });
        Ok(())
    }

    fn active_mut(&mut self) -> Result<&mut ActiveAttempt, AttemptError> {
        match &mut self.state {
            AttemptState::Ready(active) | AttemptState::Submitting(active) => Ok(active),
            other => Err(AttemptError::NotActive {
                state: other.name(),
            }),
        }
    }

    /// Select `answer_id` as the only answer to `question_id`.
    pub fn set_answer(
        &mut self,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> Result<(), AttemptError> {
        let active = self.active_mut()?;
        active.check_answer(question_id, answer_id)?;
        active.responses.set_answer(question_id, answer_id);
        Ok(())
    }

    /// Add or remove `answer_id` from the selection of `question_id`.
    pub fn toggle_answer(
        &mut self,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> Result<(), AttemptError> {
        let active = self.active_mut()?;
        active.check_answer(question_id, answer_id)?;
        active.responses.toggle_answer(question_id, answer_id);
        Ok(())
    }

    pub fn clear_answer(&mut self, question_id: QuestionId) -> Result<(), AttemptError> {
        let active = self.active_mut()?;
        if !active.questions.iter().any(|q| q.id == question_id) {
            return Err(AttemptError::UnknownQuestion { question_id });
        }
        active.responses.clear(question_id);
        Ok(())
    }

    /// Submit the current answers. Returns `false` when the controller is
    /// not `Ready`, including while a submission is already in flight.
    pub fn submit(&mut self) -> bool {
        self.begin_submission(SubmitTrigger::Manual)
    }

    /// Handle the time limit running out.
    pub fn on_timer_expired(&mut self) -> Option<AttemptUpdate> {
        let in_flight = match &mut self.state {
            AttemptState::Ready(active) => {
                active.expired = true;
                false
            }
            AttemptState::Submitting(active) => {
                active.expired = true;
                true
            }
            _ => return None,
        };

        if in_flight {
            debug!("Time ran out while a submission was in flight");
            return Some(AttemptUpdate::ExpiredWhileSubmitting);
        }
        if self.begin_submission(SubmitTrigger::Timer) {
            Some(AttemptUpdate::AutoSubmitted)
        } else {
            None
        }
    }

    fn begin_submission(&mut self, trigger: SubmitTrigger) -> bool {
        let active = match std::mem::replace(&mut self.state, AttemptState::Loading) {
            AttemptState::Ready(active) => active,
            other => {
                debug!(
                    "Ignoring {:?} submit while {}",
                    trigger,
                    other.name()
                );
                self.state = other;
                return false;
            }
        };

        let payload = active
            .responses
            .to_submission(active.attempt.attempt_id, &active.questions);
        info!(
            "Submitting attempt {} ({:?}, {}/{} answered)",
            payload.attempt_id,
            trigger,
            active.responses.answered_count(),
            active.questions.len()
        );

        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        let quiz_id = self.quiz_id;
        tokio::spawn(async move {
            let result = backend.submit_quiz(quiz_id, payload).await;
            // The controller may be gone by now; the result is then dropped.
            let _ = tx.send(AttemptEvent::Submitted(result));
        });

        self.state = AttemptState::Submitting(active);
        true
    }

    fn finish_submission(
        &mut self,
        outcome: Result<SubmitQuizResult, ApiError>,
    ) -> Option<AttemptUpdate> {
        let active = match std::mem::replace(&mut self.state, AttemptState::Loading) {
            AttemptState::Submitting(active) => active,
            other => {
                self.state = other;
                return None;
            }
        };

        match outcome.and_then(SubmitQuizResult::into_result) {
            Ok(result) => {
                info!(
                    "Attempt {} completed: score {:.1}, passed={}",
                    active.attempt.attempt_id, result.score, result.is_passed
                );
                let attempt = active.attempt.clone();
                drop(active);
                self.state = AttemptState::Completed {
                    attempt,
                    result: result.clone(),
                };
                Some(AttemptUpdate::Completed(result))
            }
            Err(e) => {
                warn!("Submit of attempt {} failed: {}", active.attempt.attempt_id, e);
                let message = e.user_message();
                self.state = AttemptState::Ready(active);
                Some(AttemptUpdate::SubmitFailed { message })
            }
        }
    }

    fn apply(&mut self, event: AttemptEvent) -> Option<AttemptUpdate> {
        match event {
            AttemptEvent::Tick(remaining_secs) => self
                .active()
                .map(|_| AttemptUpdate::Tick { remaining_secs }),
            AttemptEvent::Expired => self.on_timer_expired(),
            AttemptEvent::Submitted(outcome) => self.finish_submission(outcome),
        }
    }

    /// Wait for the next thing to show.
    ///
    /// Returns `None` right away in `Loading`, `Completed` and `Failed`.
    /// In `Ready` after the time ran out nothing else arrives until the
    /// user submits, so callers should race this against input. Dropping
    /// the future loses no events.
    pub async fn next_update(&mut self) -> Option<AttemptUpdate> {
        loop {
            self.active()?;
            let event = self.events_rx.recv().await?;
            if let Some(update) = self.apply(event) {
                return Some(update);
            }
        }
    }
}

fn load_failure_message(e: &ApiError) -> String {
    match e {
        ApiError::NotFound(_) => "This quiz is not available or has been deleted".to_string(),
        other => other.user_message(),
    }
}
