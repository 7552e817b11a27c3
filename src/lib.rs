//! LMS Quiz - timed quiz attempts from the terminal
//!
//! A client for an LMS REST backend that runs the attempt lifecycle of a
//! quiz: start the attempt, answer questions against a countdown, and
//! submit exactly once, either manually or when the time limit runs out.
//!
//! - **Quiz**: attempt state machine, countdown timer, response set
//! - **API**: envelope-aware HTTP client behind the `QuizBackend` trait
//! - **Storage**: login session and per-course progress as JSON files
//! - **Presenter**: terminal rendering of questions, countdown and results
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use lms_quiz::{api::ApiClient, AttemptController, Config};
//!
//! let config = Config::load(None)?;
//! let client = ApiClient::new(&config, config.api_token.clone())?;
//! let mut controller = AttemptController::new(Arc::new(client), 42);
//! controller.load().await?;
//! controller.submit();
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod presenter;
pub mod quiz;
pub mod storage;
pub mod telemetry;

pub use config::Config;
pub use errors::{LmsError, Result};
pub use quiz::{AttemptController, AttemptState, AttemptUpdate};
