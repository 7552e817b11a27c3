use lms_quiz::errors::{
    get_exit_code, ApiError, AttemptError, LmsError, StorageError, EXIT_API_ERROR,
    EXIT_ATTEMPT_ERROR, EXIT_ERROR, EXIT_STORAGE_ERROR,
};

#[test]
fn test_exit_codes_by_layer() {
    let api: anyhow::Error = LmsError::Api(ApiError::Timeout).into();
    assert_eq!(get_exit_code(&api), EXIT_API_ERROR);

    let attempt: anyhow::Error = LmsError::Attempt(AttemptError::InvalidQuizId).into();
    assert_eq!(get_exit_code(&attempt), EXIT_ATTEMPT_ERROR);

    let storage: anyhow::Error = LmsError::Storage(StorageError::NoDataDir).into();
    assert_eq!(get_exit_code(&storage), EXIT_STORAGE_ERROR);

    let other = anyhow::anyhow!("boom");
    assert_eq!(get_exit_code(&other), EXIT_ERROR);
}

#[test]
fn test_bare_errors_still_map() {
    let api: anyhow::Error = ApiError::NotFound("gone".to_string()).into();
    assert_eq!(get_exit_code(&api), EXIT_API_ERROR);

    let storage: anyhow::Error = StorageError::NoDataDir.into();
    assert_eq!(get_exit_code(&storage), EXIT_STORAGE_ERROR);
}

#[test]
fn test_retryable_classification() {
    assert!(ApiError::Timeout.is_retryable());
    assert!(ApiError::Network("reset".to_string()).is_retryable());
    assert!(ApiError::HttpStatus {
        status: 503,
        message: String::new()
    }
    .is_retryable());
    assert!(!ApiError::HttpStatus {
        status: 400,
        message: String::new()
    }
    .is_retryable());
    assert!(!ApiError::Authentication("no".to_string()).is_retryable());
    assert!(!ApiError::Rejected("no".to_string()).is_retryable());
}

#[test]
fn test_user_messages() {
    assert!(ApiError::Network("tcp".to_string())
        .user_message()
        .contains("internet connection"));
    assert_eq!(
        ApiError::Rejected("Quiz is closed".to_string()).user_message(),
        "Quiz is closed"
    );
    assert!(!ApiError::Parse("expected `,`".to_string())
        .user_message()
        .contains("expected"));
}
