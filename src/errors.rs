use std::path::PathBuf;
use thiserror::Error;

/// The central error type for the quiz client.
///
/// Wraps the backend, attempt and storage layers so the binary can pick an
/// exit code without string matching.
#[derive(Error, Debug)]
pub enum LmsError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Attempt error: {0}")]
    Attempt(#[from] AttemptError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Backend rejected the request: {0}")]
    Rejected(String),

    #[error("Failed to parse backend response: {0}")]
    Parse(String),

    #[error("Invalid backend data: {0}")]
    Validation(String),
}

impl ApiError {
    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout | ApiError::Network(_) => true,
            ApiError::HttpStatus { status, .. } => {
                matches!(status, 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Authentication(_))
    }

    /// The text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Timeout => "The connection timed out. Please try again later".to_string(),
            ApiError::Network(_) => {
                "Cannot reach the server. Check your internet connection".to_string()
            }
            ApiError::Authentication(msg)
            | ApiError::NotFound(msg)
            | ApiError::Rejected(msg)
            | ApiError::HttpStatus { message: msg, .. } => msg.clone(),
            ApiError::Parse(_) | ApiError::Validation(_) => {
                "The server sent data this client does not understand".to_string()
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error("Invalid quiz identifier")]
    InvalidQuizId,

    #[error("Failed to start the quiz: {0}")]
    Load(#[source] ApiError),

    #[error("Question {question_id} is not part of this attempt")]
    UnknownQuestion { question_id: u64 },

    #[error("Answer {answer_id} does not belong to question {question_id}")]
    UnknownAnswer { question_id: u64, answer_id: u64 },

    #[error("No active attempt (controller is {state})")]
    NotActive { state: &'static str },

    #[error("Attempt already started (controller is {state})")]
    AlreadyStarted { state: &'static str },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Stored data at {path} is corrupted: {message}")]
    Corrupted { path: PathBuf, message: String },

    #[error("No data directory available")]
    NoDataDir,
}

pub type Result<T> = std::result::Result<T, LmsError>;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_API_ERROR: u8 = 4;
pub const EXIT_ATTEMPT_ERROR: u8 = 5;
pub const EXIT_STORAGE_ERROR: u8 = 6;

/// Determine the appropriate process exit code for an error.
pub fn get_exit_code(e: &anyhow::Error) -> u8 {
    if let Some(lms_err) = e.downcast_ref::<LmsError>() {
        return match lms_err {
            LmsError::Config(_) => EXIT_CONFIG_ERROR,
            LmsError::Api(_) => EXIT_API_ERROR,
            LmsError::Attempt(_) => EXIT_ATTEMPT_ERROR,
            LmsError::Storage(_) => EXIT_STORAGE_ERROR,
        };
    }

    if e.downcast_ref::<ApiError>().is_some() {
        return EXIT_API_ERROR;
    }
    if e.downcast_ref::<AttemptError>().is_some() {
        return EXIT_ATTEMPT_ERROR;
    }
    if e.downcast_ref::<StorageError>().is_some() {
        return EXIT_STORAGE_ERROR;
    }

    EXIT_ERROR
}
