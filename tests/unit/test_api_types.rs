//! Wire format tests: envelope handling, start payload conversion and
//! failure descriptions.

use lms_quiz::api::types::{Envelope, QuizSummary, StartQuizData, SubmitQuizResult};
use lms_quiz::api::{classify_failure, describe_failure};
use lms_quiz::errors::ApiError;
use lms_quiz::quiz::QuestionType;

const START_BODY: &str = r#"{
  "success": true,
  "message": null,
  "data": {
    "attemptId": 501,
    "quizId": 12,
    "quizTitle": "Ownership basics",
    "timeLimit": 15,
    "startedAt": "2024-05-01T10:00:00.123",
    "questions": [
      {
        "id": 2,
        "questionText": "Is Rust memory safe?",
        "questionType": 1,
        "orderIndex": 1,
        "answers": [
          { "id": 21, "answerText": "No", "orderIndex": 1 },
          { "id": 20, "answerText": "Yes", "orderIndex": 0 }
        ]
      },
      {
        "id": 1,
        "questionText": "Which keyword moves?",
        "questionType": 0,
        "orderIndex": 0,
        "answers": [
          { "id": 10, "answerText": "move", "orderIndex": 0 }
        ]
      }
    ]
  },
  "errors": null
}"#;

fn start_data() -> StartQuizData {
    let envelope: Envelope<StartQuizData> = serde_json::from_str(START_BODY).unwrap();
    envelope.into_data().unwrap()
}

mod envelope_tests {
    use super::*;

    #[test]
    fn test_rejected_uses_message() {
        let envelope: Envelope<StartQuizData> = serde_json::from_str(
            r#"{"success": false, "message": "Quiz has already been completed", "data": null}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.into_data().unwrap_err(),
            ApiError::Rejected("Quiz has already been completed".to_string())
        );
    }

    #[test]
    fn test_rejected_falls_back_to_errors() {
        let envelope: Envelope<StartQuizData> = serde_json::from_str(
            r#"{"success": false, "message": "", "errors": ["closed", "late"]}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.into_data().unwrap_err(),
            ApiError::Rejected("closed, late".to_string())
        );
    }

    #[test]
    fn test_success_without_data_is_rejected() {
        let envelope: Envelope<Vec<QuizSummary>> =
            serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(
            envelope.into_data(),
            Err(ApiError::Rejected(_))
        ));
    }

    #[test]
    fn test_list_without_data_is_empty() {
        let history: Envelope<Vec<SubmitQuizResult>> = serde_json::from_str(
            r#"{"success":true,"message":"","data":null,"errors":[]}"#,
        )
        .unwrap();
        assert!(history.into_list().unwrap().is_empty());

        let quizzes: Envelope<Vec<QuizSummary>> =
            serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(quizzes.into_list().unwrap().is_empty());
    }

    #[test]
    fn test_list_rejection_keeps_message() {
        let envelope: Envelope<Vec<QuizSummary>> = serde_json::from_str(
            r#"{"success":false,"message":"Not enrolled","data":[]}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.into_list().unwrap_err(),
            ApiError::Rejected("Not enrolled".to_string())
        );
    }
}

mod start_tests {
    use super::*;

    #[test]
    fn test_into_attempt_sorts_and_converts() {
        let (attempt, questions) = start_data().into_attempt().unwrap();

        assert_eq!(attempt.attempt_id, 501);
        assert_eq!(attempt.quiz_id, 12);
        assert_eq!(attempt.time_limit_seconds, 15 * 60);
        assert_eq!(
            attempt.started_at.to_rfc3339(),
            "2024-05-01T10:00:00.123+00:00"
        );

        let ids: Vec<u64> = questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(questions[0].question_type, QuestionType::SingleChoice);
        assert_eq!(questions[1].question_type, QuestionType::TrueFalse);

        let answers: Vec<&str> = questions[1].answers.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(answers, vec!["Yes", "No"]);
    }

    #[test]
    fn test_non_positive_time_limit_rejected() {
        let mut data = start_data();
        data.time_limit = 0;
        assert!(matches!(data.into_attempt(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_no_questions_rejected() {
        let mut data = start_data();
        data.questions.clear();
        assert!(matches!(data.into_attempt(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_unknown_question_type_rejected() {
        let mut data = start_data();
        data.questions[0].question_type = 7;
        assert!(matches!(data.into_attempt(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_duplicate_question_rejected() {
        let mut data = start_data();
        data.questions[1].id = data.questions[0].id;
        assert!(matches!(data.into_attempt(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_bad_timestamp_fails_to_parse() {
        let body = START_BODY.replace("2024-05-01T10:00:00.123", "yesterday");
        assert!(serde_json::from_str::<Envelope<StartQuizData>>(&body).is_err());
    }
}

mod submit_tests {
    use super::*;

    fn result_json(correct: u32, total: u32) -> String {
        format!(
            r#"{{
              "id": 501, "userId": 3, "userFullName": "Ada", "quizId": 12,
              "quizTitle": "Ownership basics",
              "startedAt": "2024-05-01T10:00:00Z",
              "completedAt": "2024-05-01T10:07:30Z",
              "score": 80.0, "correctAnswers": {}, "totalQuestions": {},
              "isPassed": true
            }}"#,
            correct, total
        )
    }

    #[test]
    fn test_into_result() {
        let dto: SubmitQuizResult = serde_json::from_str(&result_json(4, 5)).unwrap();
        let result = dto.into_result().unwrap();
        assert_eq!(result.attempt_id, 501);
        assert_eq!(result.correct_answers, 4);
        assert!(result.is_passed);
        assert!(result.completed_at.is_some());
    }

    #[test]
    fn test_more_correct_than_total_rejected() {
        let dto: SubmitQuizResult = serde_json::from_str(&result_json(6, 5)).unwrap();
        assert!(matches!(dto.into_result(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_missing_completed_at() {
        let json = result_json(1, 1).replace(r#""completedAt": "2024-05-01T10:07:30Z","#, "");
        let dto: SubmitQuizResult = serde_json::from_str(&json).unwrap();
        assert!(dto.completed_at.is_none());
    }
}

mod failure_tests {
    use super::*;

    #[test]
    fn test_classify_auth_and_not_found() {
        assert!(classify_failure(401, "").is_auth());
        assert!(classify_failure(403, "").is_auth());
        assert!(matches!(
            classify_failure(404, ""),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            classify_failure(500, ""),
            ApiError::HttpStatus { status: 500, .. }
        ));
    }

    #[test]
    fn test_describe_prefers_body_message() {
        assert_eq!(
            describe_failure(400, r#"{"success": false, "message": "Attempt expired"}"#),
            "Attempt expired"
        );
    }

    #[test]
    fn test_describe_validation_field_map() {
        let msg = describe_failure(
            400,
            r#"{"errors": {"AttemptId": ["The AttemptId field is required."]}}"#,
        );
        assert_eq!(msg, "The AttemptId field is required.");
    }

    #[test]
    fn test_describe_ignores_html() {
        let msg = describe_failure(502, "<html><body>Bad Gateway</body></html>");
        assert!(!msg.contains("<html>"));
        assert!(!msg.is_empty());
    }

    #[test]
    fn test_describe_plain_text() {
        assert_eq!(describe_failure(500, "database down"), "database down");
    }
}
