use lms_quiz::quiz::{AnswerOption, Question, QuestionType, ResponseSet};

fn question(id: u64, order: i64) -> Question {
    Question {
        id,
        text: format!("Q{}", id),
        question_type: QuestionType::SingleChoice,
        order_index: order,
        answers: (1..=3)
            .map(|k| AnswerOption {
                id: id * 10 + k,
                text: format!("A{}", k),
                order_index: k as i64,
            })
            .collect(),
    }
}

#[test]
fn test_set_answer_replaces() {
    let mut responses = ResponseSet::new();
    responses.set_answer(1, 11);
    responses.set_answer(1, 12);
    assert_eq!(responses.selected(1), &[12]);
    assert_eq!(responses.answered_count(), 1);
}

#[test]
fn test_toggle_to_empty_unanswers() {
    let mut responses = ResponseSet::new();
    responses.toggle_answer(2, 21);
    responses.toggle_answer(2, 22);
    assert_eq!(responses.selected(2), &[21, 22]);

    responses.toggle_answer(2, 21);
    responses.toggle_answer(2, 22);
    assert!(responses.selected(2).is_empty());
    assert!(responses.is_empty());
}

#[test]
fn test_submission_lists_every_question_in_order() {
    let questions = vec![question(1, 0), question(2, 1), question(3, 2)];
    let mut responses = ResponseSet::new();
    responses.set_answer(3, 31);
    responses.set_answer(1, 12);
    responses.set_answer(99, 991);

    let request = responses.to_submission(77, &questions);
    assert_eq!(request.attempt_id, 77);

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "attemptId": 77,
            "answers": [
                { "questionId": 1, "selectedAnswerIds": [12] },
                { "questionId": 2, "selectedAnswerIds": [] },
                { "questionId": 3, "selectedAnswerIds": [31] }
            ]
        })
    );
}

#[test]
fn test_clear_removes_selection() {
    let mut responses = ResponseSet::new();
    responses.set_answer(1, 11);
    responses.clear(1);
    responses.clear(5);
    assert!(responses.is_empty());
}
