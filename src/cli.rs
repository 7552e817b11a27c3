//! LMS Quiz - terminal client
//!
//! Take timed quizzes, review attempt history and track course progress.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::api::types::LoginRequest;
use crate::api::{ApiClient, QuizBackend};
use crate::config::Config;
use crate::errors::{ApiError, AttemptError, LmsError, StorageError};
use crate::presenter;
use crate::quiz::{
    AnswerId, AttemptController, AttemptState, AttemptUpdate, CourseId, QuestionId, QuizId,
    SubmitResult,
};
use crate::storage::{ProgressStore, Session, SessionStore};
use crate::telemetry::init_tracing;

#[derive(Parser)]
#[command(name = "lms-quiz")]
#[command(about = "Take timed LMS quizzes from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Log request flow and state transitions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a timed attempt at a quiz
    Take {
        quiz_id: QuizId,
        /// Course the quiz belongs to; enables local progress tracking
        #[arg(long)]
        course: Option<CourseId>,
    },
    /// Show your past attempts
    History {
        /// Only attempts within this course
        #[arg(long)]
        course: Option<CourseId>,
    },
    /// List the quizzes of a course
    Quizzes { course_id: CourseId },
    /// Show locally recorded passed quizzes for a course
    Progress { course_id: CourseId },
    /// Log in and remember the session token
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    let ctx = AppContext::new(config);

    match cli.command {
        Commands::Take { quiz_id, course } => take_quiz(&ctx, quiz_id, course).await,
        Commands::History { course } => {
            let client = ctx.client()?;
            let entries = match course {
                Some(course_id) => client.course_attempts(course_id).await,
                None => client.attempts_history().await,
            }
            .map_err(|e| ctx.api_failure(e))?;
            print!("{}", presenter::render_history(&entries));
            Ok(())
        }
        Commands::Quizzes { course_id } => {
            let client = ctx.client()?;
            let quizzes = client
                .course_quizzes(course_id)
                .await
                .map_err(|e| ctx.api_failure(e))?;
            let user_id = ctx.user_id(&client).await;
            let store = ctx
                .progress()
                .map_err(|e| warn!("Progress unavailable: {}", e))
                .ok();
            print!(
                "{}",
                presenter::render_quizzes(course_id, &quizzes, |quiz_id| {
                    store
                        .as_ref()
                        .is_some_and(|s| s.is_passed(user_id, course_id, quiz_id))
                })
            );
            Ok(())
        }
        Commands::Progress { course_id } => {
            let store = ctx.progress()?;
            let client = ctx.client()?;
            let progress = store.course(ctx.user_id(&client).await, course_id);
            print!(
                "{}",
                presenter::render_progress(course_id, &progress.passed_quizzes)
            );
            Ok(())
        }
        Commands::Login { email, password } => login(&ctx, email, password).await,
        Commands::Logout => {
            let store = ctx.sessions().ok_or(LmsError::Storage(StorageError::NoDataDir))?;
            if store.clear().map_err(LmsError::from)? {
                println!("Logged out.");
            } else {
                println!("No stored session.");
            }
            Ok(())
        }
    }
}

struct AppContext {
    config: Config,
    session: Option<Session>,
}

impl AppContext {
    fn new(config: Config) -> Self {
        let session = config
            .data_dir()
            .map(|dir| SessionStore::new(&dir))
            .and_then(|store| match store.load() {
                Ok(session) => session,
                Err(e) => {
                    warn!("Ignoring stored session: {}", e);
                    None
                }
            });
        Self { config, session }
    }

    fn sessions(&self) -> Option<SessionStore> {
        self.config.data_dir().map(|dir| SessionStore::new(&dir))
    }

    /// Token from config wins over the one saved by `login`.
    fn token(&self) -> Option<String> {
        self.config
            .api_token
            .clone()
            .or_else(|| self.session.as_ref().map(|s| s.token.clone()))
    }

    /// Owner of progress records: the stored session's user, else the owner
    /// of the configured token as reported by the backend, else 0.
    async fn user_id(&self, client: &ApiClient) -> u64 {
        if let Some(session) = &self.session {
            return session.user_id;
        }
        if self.token().is_none() {
            return 0;
        }
        match client.current_user().await {
            Ok(user) => user.id,
            Err(e) => {
                warn!("Could not resolve the current user: {}", e);
                0
            }
        }
    }

    fn client(&self) -> Result<ApiClient> {
        ApiClient::new(&self.config, self.token())
    }

    fn progress(&self) -> std::result::Result<ProgressStore, StorageError> {
        let dir = self.config.data_dir().ok_or(StorageError::NoDataDir)?;
        ProgressStore::open(&dir)
    }

    /// Report an API failure; auth failures also drop the stored session.
    fn api_failure(&self, e: ApiError) -> anyhow::Error {
        eprintln!("{}", presenter::render_error(&e.user_message()));
        if e.is_auth() {
            self.forget_session();
        }
        LmsError::Api(e).into()
    }

    fn forget_session(&self) {
        if let Some(store) = self.sessions() {
            match store.clear() {
                Ok(true) => eprintln!(
                    "{}",
                    presenter::render_notice("Session cleared. Run `lms-quiz login` again.")
                ),
                Ok(false) => {}
                Err(e) => warn!("Failed to clear session: {}", e),
            }
        }
    }

    fn record_pass(&self, user_id: u64, course_id: CourseId, result: &SubmitResult) {
        let outcome = self
            .progress()
            .and_then(|mut store| store.mark_passed(user_id, course_id, result.quiz_id));
        if let Err(e) = outcome {
            warn!("Failed to save progress: {}", e);
            eprintln!(
                "{}",
                presenter::render_error(&format!("Could not save progress: {}", e))
            );
        }
    }
}

async fn login(ctx: &AppContext, email: String, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            eprint!("Password (input is visible): ");
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            lines
                .next_line()
                .await
                .context("Failed to read password")?
                .unwrap_or_default()
        }
    };
    let password = checked_password(password)?;

    let client = ApiClient::new(&ctx.config, None)?;
    let data = client
        .login(&LoginRequest { email, password })
        .await
        .map_err(|e| ctx.api_failure(e))?;

    let store = ctx.sessions().ok_or(LmsError::Storage(StorageError::NoDataDir))?;
    store
        .save(&Session {
            token: data.token,
            refresh_token: data.refresh_token,
            user_id: data.user.id,
            role: data.user.role,
        })
        .map_err(LmsError::from)?;
    println!("Logged in as {}.", data.user.full_name);
    Ok(())
}

/// Reject a blank password before it reaches the backend.
fn checked_password(password: String) -> std::result::Result<String, LmsError> {
    if password.trim().is_empty() {
        return Err(LmsError::Config("A password is required to log in".to_string()));
    }
    Ok(password)
}

/// A line typed during an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum InputCommand {
    Select { question: usize, option: usize },
    Toggle { question: usize, option: usize },
    Clear { question: usize },
    Submit,
    List,
    Help,
    Quit,
}

const INPUT_HELP: &str = "Commands: <q> <n> select option n of question q · t <q> <n> toggle · c <q> clear · l list · s submit · q quit";

fn parse_command(line: &str) -> std::result::Result<InputCommand, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let number = |s: &str| {
        s.parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("'{}' is not a valid number", s))
    };

    match parts.as_slice() {
        ["s"] | ["submit"] => Ok(InputCommand::Submit),
        ["l"] | ["list"] => Ok(InputCommand::List),
        ["h"] | ["help"] | ["?"] => Ok(InputCommand::Help),
        ["q"] | ["quit"] => Ok(InputCommand::Quit),
        ["c", q] => Ok(InputCommand::Clear {
            question: number(q)?,
        }),
        ["t", q, n] => Ok(InputCommand::Toggle {
            question: number(q)?,
            option: number(n)?,
        }),
        [q, n] => Ok(InputCommand::Select {
            question: number(q)?,
            option: number(n)?,
        }),
        [] => Err("Empty input".to_string()),
        _ => Err(format!("Unknown command '{}'", line.trim())),
    }
}

/// Map 1-based question/option numbers to ids.
fn resolve(
    controller: &AttemptController,
    question: usize,
    option: Option<usize>,
) -> std::result::Result<(QuestionId, Option<AnswerId>), String> {
    let active = controller
        .active()
        .ok_or_else(|| "The attempt is no longer active".to_string())?;
    let q = active
        .questions()
        .get(question - 1)
        .ok_or_else(|| format!("There is no question {}", question))?;
    let answer = match option {
        Some(n) => Some(
            q.answers
                .get(n - 1)
                .map(|a| a.id)
                .ok_or_else(|| format!("Question {} has no option {}", question, n))?,
        ),
        None => None,
    };
    Ok((q.id, answer))
}

fn print_questions(controller: &AttemptController) {
    if let Some(active) = controller.active() {
        for (i, q) in active.questions().iter().enumerate() {
            print!(
                "{}",
                presenter::render_question(i + 1, q, active.responses().selected(q.id))
            );
        }
    }
}

/// Apply one typed command. Returns `false` when the user quits.
fn handle_input(controller: &mut AttemptController, command: InputCommand) -> bool {
    let outcome: std::result::Result<(), String> = match command {
        InputCommand::Select { question, option } => resolve(controller, question, Some(option))
            .and_then(|(qid, aid)| {
                let aid = aid.ok_or_else(|| "No option given".to_string())?;
                controller
                    .set_answer(qid, aid)
                    .map_err(|e: AttemptError| e.to_string())
            }),
        InputCommand::Toggle { question, option } => resolve(controller, question, Some(option))
            .and_then(|(qid, aid)| {
                let aid = aid.ok_or_else(|| "No option given".to_string())?;
                controller
                    .toggle_answer(qid, aid)
                    .map_err(|e: AttemptError| e.to_string())
            }),
        InputCommand::Clear { question } => resolve(controller, question, None)
            .and_then(|(qid, _)| controller.clear_answer(qid).map_err(|e| e.to_string())),
        InputCommand::Submit => {
            if controller.submit() {
                println!("Submitting your answers...");
            } else {
                println!("A submission is already in progress.");
            }
            Ok(())
        }
        InputCommand::List => {
            print_questions(controller);
            Ok(())
        }
        InputCommand::Help => {
            println!("{}", INPUT_HELP);
            Ok(())
        }
        InputCommand::Quit => return false,
    };

    if let Err(message) = outcome {
        eprintln!("{}", presenter::render_error(&message));
    }
    true
}

async fn take_quiz(ctx: &AppContext, quiz_id: QuizId, course: Option<CourseId>) -> Result<()> {
    let client = ctx.client()?;
    let user_id = match course {
        Some(_) => ctx.user_id(&client).await,
        None => 0,
    };
    let backend: Arc<dyn QuizBackend> = Arc::new(client);
    let mut controller = AttemptController::new(backend, quiz_id);

    if let Err(e) = controller.load().await {
        if let AttemptState::Failed { message } = controller.state() {
            eprintln!("{}", presenter::render_error(message));
        }
        if let AttemptError::Load(api) = &e {
            if api.is_auth() {
                ctx.forget_session();
            }
        }
        return Err(LmsError::Attempt(e).into());
    }

    if let Some(active) = controller.active() {
        println!(
            "{}",
            presenter::render_header(active.attempt(), active.questions().len())
        );
    }
    print_questions(&controller);
    println!("{}", INPUT_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            update = controller.next_update() => {
                let Some(update) = update else { break };
                match update {
                    AttemptUpdate::Tick { remaining_secs } => {
                        if presenter::should_announce(remaining_secs) {
                            println!("{}", presenter::render_countdown(remaining_secs));
                        }
                    }
                    AttemptUpdate::AutoSubmitted => println!(
                        "{}",
                        presenter::render_notice("Time is up! Your answers are being submitted automatically.")
                    ),
                    AttemptUpdate::ExpiredWhileSubmitting => println!(
                        "{}",
                        presenter::render_notice("Time is up. Your submission is already on its way.")
                    ),
                    AttemptUpdate::SubmitFailed { message } => {
                        eprintln!("{}", presenter::render_error(&message));
                        println!("Type `s` to submit again.");
                    }
                    AttemptUpdate::Completed(result) => {
                        println!("{}", presenter::render_result(&result));
                        if result.is_passed {
                            if let Some(course_id) = course {
                                ctx.record_pass(user_id, course_id, &result);
                            }
                        }
                        break;
                    }
                }
            }
            line = lines.next_line() => {
                let line = line.context("Failed to read input")?;
                let Some(line) = line else {
                    println!("Input closed.");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(command) => {
                        if !handle_input(&mut controller, command) {
                            break;
                        }
                    }
                    Err(message) => eprintln!("{}", presenter::render_error(&message)),
                }
            }
        }
    }

    if let Some(message) = leave_message(controller.state()) {
        println!("{}", presenter::render_notice(message));
    }
    Ok(())
}

/// What to tell the user when the session ends before a result arrived.
fn leave_message(state: &AttemptState) -> Option<&'static str> {
    if state.is_terminal() {
        return None;
    }
    Some(match state {
        AttemptState::Submitting(_) => {
            "Leaving while the submission is in flight. Check `lms-quiz history` for the result."
        }
        _ => "Leaving the quiz; the attempt was not submitted.",
    })
}
