use lms_quiz::errors::StorageError;
use lms_quiz::storage::progress::PROGRESS_FILE;
use lms_quiz::storage::{ProgressStore, Session, SessionStore};

#[test]
fn test_progress_is_per_user_and_course() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ProgressStore::open(dir.path()).unwrap();

    store.mark_passed(1, 100, 5).unwrap();
    store.mark_passed(2, 100, 6).unwrap();
    store.mark_passed(1, 200, 7).unwrap();

    let reopened = ProgressStore::open(dir.path()).unwrap();
    assert_eq!(reopened.course(1, 100).passed_quizzes, vec![5]);
    assert_eq!(reopened.course(2, 100).passed_quizzes, vec![6]);
    assert_eq!(reopened.course(1, 200).passed_quizzes, vec![7]);
}

#[test]
fn test_progress_file_layout() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ProgressStore::open(dir.path()).unwrap();
    store.mark_passed(3, 4, 9).unwrap();

    let raw = std::fs::read_to_string(dir.path().join(PROGRESS_FILE)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        json["courses"]["user_3_course_4"]["passed_quizzes"],
        serde_json::json!([9])
    );
}

#[test]
fn test_corrupted_progress_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(PROGRESS_FILE), "[1, 2").unwrap();
    assert!(matches!(
        ProgressStore::open(dir.path()),
        Err(StorageError::Corrupted { .. })
    ));
}

#[test]
fn test_session_roundtrip_and_logout() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let session = Session {
        token: "jwt".to_string(),
        refresh_token: None,
        user_id: 8,
        role: Some("Student".to_string()),
    };

    store.save(&session).unwrap();
    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.user_id, 8);
    assert_eq!(loaded.role.as_deref(), Some("Student"));

    assert!(store.clear().unwrap());
    assert!(store.load().unwrap().is_none());
}
