// tests/authoring_tests.rs

mod common;

use std::time::Duration;

use assessment_engine::{
    AppError,
    models::{
        assessment::{AssessmentKind, Status},
        item::{AnswerBody, QuestionType},
        payload::{Identifier, SaveResponse},
    },
    session::{AuthoringSession, ItemField, SaveOutcome, Tone, ValidationOutcome},
};
use common::{Harness, harness, quiz_kind, quiz_ref};
use serde_json::json;

/// Fills item `index` with a complete multiple-choice question.
fn fill_multiple_choice(session: &mut AuthoringSession, index: usize, question: &str, choices: &[&str], answer: usize) {
    session
        .set_item_field(index, ItemField::Question(question.to_string()))
        .unwrap();
    session
        .set_item_field(
            index,
            ItemField::Choices(choices.iter().map(|c| c.to_string()).collect()),
        )
        .unwrap();
    assert!(session.set_answer(index, answer).unwrap());
}

#[tokio::test]
async fn new_session_starts_with_one_blank_item() {
    // Arrange
    let Harness { context, .. } = harness();

    // Act
    let session = context.author(quiz_kind());

    // Assert
    assert_eq!(session.items().len(), 1);
    assert_eq!(session.active_item(), 0);
    let item = session.item(0).unwrap();
    assert_eq!(item.question_type(), QuestionType::MultipleChoice);
    assert_eq!(item.choices().len(), 4);
    assert!(item.is_plain_text);
    assert!(session.assessment().id.is_none());
}

#[tokio::test]
async fn adding_and_removing_items_moves_focus() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut session = context.author(quiz_kind());

    // Act
    let second = session.add_item();
    let third = session.add_item();

    // Assert
    assert_eq!((second, third), (1, 2));
    assert_eq!(session.active_item(), 2);

    assert!(session.remove_item(2).unwrap());
    assert_eq!(session.active_item(), 1);

    assert!(session.remove_item(0).unwrap());
    assert_eq!(session.items().len(), 1);
    assert!(!session.remove_item(0).unwrap());
    assert_eq!(session.items().len(), 1);

    assert!(matches!(session.remove_item(5), Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn switching_question_type_resets_answer_and_errors() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut session = context.author(quiz_kind());
    session.set_title("Types");
    assert_eq!(session.validate(), ValidationOutcome::ItemInvalid { index: 0 });
    assert!(session.item(0).unwrap().errors.question_error.is_some());

    // Act
    session
        .set_item_field(0, ItemField::QuestionType(QuestionType::TrueFalse))
        .unwrap();

    // Assert
    let item = session.item(0).unwrap();
    assert_eq!(item.body, AnswerBody::TrueFalse { answer: None });
    assert!(item.errors.is_empty());
    assert!(matches!(
        session.set_item_field(0, ItemField::IdentificationAnswer("x".into())),
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn add_choice_requires_existing_choices_filled() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut session = context.author(quiz_kind());

    // Act
    let refused = session.add_choice(0).unwrap();

    // Assert
    assert!(!refused);
    assert_eq!(
        session.item(0).unwrap().errors.choices_error.as_deref(),
        Some("Fill all choices before adding a new one.")
    );

    for (i, text) in ["a", "b", "c", "d"].iter().enumerate() {
        session.set_choice(0, i, text).unwrap();
    }
    assert!(session.add_choice(0).unwrap());
    let item = session.item(0).unwrap();
    assert_eq!(item.choices().len(), 5);
    assert!(item.errors.choices_error.is_none());
}

#[tokio::test]
async fn removing_choices_keeps_answer_on_same_text() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut session = context.author(quiz_kind());
    fill_multiple_choice(&mut session, 0, "Pick C", &["A", "B", "C", "D"], 2);

    // Act
    assert!(session.remove_choice(0, 0).unwrap());

    // Assert
    let item = session.item(0).unwrap();
    assert_eq!(item.choices(), ["B", "C", "D"]);
    assert_eq!(item.answer_index(), Some(1));
    assert_eq!(item.effective_answer(), "C");

    assert!(session.remove_choice(0, 2).unwrap());
    assert_eq!(session.item(0).unwrap().answer_index(), Some(1));

    assert!(!session.remove_choice(0, 0).unwrap());
    assert_eq!(session.item(0).unwrap().choices().len(), 2);
}

#[tokio::test]
async fn removing_the_selected_choice_clears_the_answer() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut session = context.author(quiz_kind());
    fill_multiple_choice(&mut session, 0, "Pick B", &["A", "B", "C"], 1);

    // Act
    session.remove_choice(0, 1).unwrap();

    // Assert
    let item = session.item(0).unwrap();
    assert_eq!(item.answer_index(), None);
    assert_eq!(item.effective_answer(), "");
}

#[tokio::test]
async fn empty_choice_cannot_become_the_answer() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut session = context.author(quiz_kind());

    // Act
    let accepted = session.set_answer(0, 1).unwrap();

    // Assert
    assert!(!accepted);
    assert_eq!(session.item(0).unwrap().answer_index(), None);
    assert_eq!(
        session.item(0).unwrap().errors.answer_error.as_deref(),
        Some("Please enter a valid choice before setting it as the answer.")
    );
}

#[tokio::test]
async fn validation_stops_at_first_invalid_item() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut session = context.author(quiz_kind());
    fill_multiple_choice(&mut session, 0, "Fine", &["x", "y"], 0);
    session.add_item();
    session.add_item();

    // Act
    let without_title = session.validate();
    session.set_title("Quiz 1");
    let with_title = session.validate();

    // Assert
    assert_eq!(without_title, ValidationOutcome::TitleMissing);
    assert_eq!(session.title_error(), None);
    assert_eq!(with_title, ValidationOutcome::ItemInvalid { index: 1 });
    assert!(session.item(0).unwrap().errors.is_empty());
    assert_eq!(
        session.item(1).unwrap().errors.question_error.as_deref(),
        Some("Question cannot be empty.")
    );
    assert!(session.item(2).unwrap().errors.is_empty());
}

#[tokio::test]
async fn title_error_uses_the_assessment_noun() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut quiz = context.author(quiz_kind());
    let mut test = context.author(AssessmentKind::ReadingTest);

    // Act
    quiz.validate();
    test.validate();

    // Assert
    assert_eq!(quiz.title_error(), Some("Quiz title cannot be empty."));
    assert_eq!(test.title_error(), Some("Test title cannot be empty."));
}

#[tokio::test]
async fn reading_test_requires_passage_text() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut session = context.author(AssessmentKind::ReadingTest);
    session.set_title("Passage 1");

    // Act
    let outcome = session.validate();

    // Assert
    assert_eq!(outcome, ValidationOutcome::TextMissing);
    assert_eq!(session.text_error(), Some("Test text cannot be empty."));

    session.set_description_or_text("Once upon a time.");
    assert_eq!(session.validate(), ValidationOutcome::ItemInvalid { index: 0 });
    assert_eq!(session.text_error(), None);
}

#[tokio::test]
async fn draft_save_skips_item_rules_but_publish_does_not() {
    // Arrange
    let Harness { context, store, .. } = harness();
    let mut session = context.author(quiz_kind());
    session.set_title("Unfinished");
    session
        .set_item_field(0, ItemField::Question("No answer yet".into()))
        .unwrap();

    // Act
    let published = session.publish().await.unwrap();

    // Assert
    assert_eq!(
        published,
        SaveOutcome::Rejected(ValidationOutcome::ItemInvalid { index: 0 })
    );
    assert!(store.saves().is_empty());
    let notice = session.take_notice().unwrap();
    assert_eq!(notice.tone, Tone::Danger);
    assert_eq!(notice.message, "Please fill all the required fields.");

    let drafted = session.save_as_draft().await.unwrap();
    assert_eq!(
        drafted,
        SaveOutcome::Saved {
            id: Some(Identifier::Number(500)),
            status: Status::Draft,
        }
    );
    let sent = store.saves_json();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].get("quiz_status").is_none());
    assert_eq!(sent[0]["items"][0]["answer"], "");
}

#[tokio::test]
async fn draft_save_without_title_sends_nothing() {
    // Arrange
    let Harness { context, store, .. } = harness();
    let mut session = context.author(quiz_kind());

    // Act
    let outcome = session.save_as_draft().await.unwrap();

    // Assert
    assert_eq!(outcome, SaveOutcome::Rejected(ValidationOutcome::TitleMissing));
    assert!(store.saves().is_empty());
}

#[tokio::test]
async fn publish_sends_derived_answers_and_status_flag() {
    // Arrange
    let Harness { context, store, .. } = harness();
    let mut session = context.author(quiz_kind());
    session.set_title("Capitals");
    session.set_description_or_text("Europe");
    fill_multiple_choice(&mut session, 0, "Capital of France?", &["Paris", "Rome", "Madrid", "Berlin"], 0);
    session.add_item();
    session
        .set_item_field(1, ItemField::QuestionType(QuestionType::TrueFalse))
        .unwrap();
    session
        .set_item_field(1, ItemField::Question("Rome is in Italy".into()))
        .unwrap();
    session
        .set_item_field(1, ItemField::TrueFalseAnswer(Some(true)))
        .unwrap();

    // Act
    let outcome = session.publish().await.unwrap();

    // Assert
    assert_eq!(
        outcome,
        SaveOutcome::Saved {
            id: Some(Identifier::Number(500)),
            status: Status::Published,
        }
    );
    let sent = store.saves_json();
    assert_eq!(sent[0]["quiz_status"], 1);
    assert_eq!(sent[0]["quiz_title"], "Capitals");
    assert_eq!(sent[0]["module_id"], common::MODULE_ID);
    assert_eq!(sent[0]["items"][0]["answer"], "Paris");
    assert_eq!(sent[0]["items"][0]["question_type"], "multipleChoice");
    assert_eq!(sent[0]["items"][1]["answer"], "True");
    assert!(sent[0]["items"][1].get("choices").is_none());

    assert!(session.assessment().is_published());
    let notice = session.notice().unwrap();
    assert_eq!(notice.tone, Tone::Success);
    assert_eq!(notice.message, "The quiz has been published.");
}

#[tokio::test]
async fn returned_item_ids_are_merged_by_position() {
    // Arrange
    let Harness { context, store, .. } = harness();
    let mut session = context.author(quiz_kind());
    session.set_title("Ids");
    session.add_item();
    session.add_item();
    store.queue_save_reply(Ok(SaveResponse {
        success: true,
        message: None,
        id: Some(Identifier::Number(42)),
        items: vec![
            Identifier::Number(101),
            Identifier::Number(102),
            Identifier::Number(103),
        ],
    }));

    // Act
    session.save_as_draft().await.unwrap();

    // Assert
    let ids: Vec<_> = session.items().iter().map(|i| i.id.clone()).collect();
    assert_eq!(
        ids,
        vec![
            Some(Identifier::Number(101)),
            Some(Identifier::Number(102)),
            Some(Identifier::Number(103)),
        ]
    );
    assert_eq!(session.assessment().id, Some(Identifier::Number(42)));

    // A second save carries the ids back.
    session.save_as_draft().await.unwrap();
    let sent = store.saves_json();
    assert_eq!(sent[1]["quiz_id"], 42);
    assert_eq!(sent[1]["items"][2]["question_id"], 103);
}

#[tokio::test]
async fn store_failure_keeps_local_state() {
    // Arrange
    let Harness { context, store, .. } = harness();
    let mut session = context.author(quiz_kind());
    session.set_title("Offline");
    store.queue_save_reply(Err(AppError::Persistence("timeout".into())));

    // Act
    let result = session.save_as_draft().await;

    // Assert
    assert!(matches!(result, Err(AppError::Persistence(_))));
    assert_eq!(session.assessment().title, "Offline");
    assert!(session.assessment().id.is_none());
    assert!(session.assessment().status.is_none());
    let notice = session.notice().unwrap();
    assert_eq!(notice.tone, Tone::Danger);
    assert_eq!(notice.message, "An unexpected error occurred. Please try again.");
}

#[tokio::test]
async fn rejected_save_surfaces_store_message() {
    // Arrange
    let Harness { context, store, .. } = harness();
    let mut session = context.author(quiz_kind());
    session.set_title("Duplicate");
    store.queue_save_reply(Ok(SaveResponse {
        success: false,
        message: Some("Quiz title already exists.".into()),
        id: None,
        items: vec![],
    }));

    // Act
    let result = session.save_as_draft().await;

    // Assert
    assert_eq!(
        result,
        Err(AppError::Persistence("Quiz title already exists.".into()))
    );
    assert_eq!(session.notice().unwrap().message, "Quiz title already exists.");
    assert!(session.items()[0].id.is_none());
}

#[tokio::test(start_paused = true)]
async fn rapid_title_edits_write_one_draft() {
    // Arrange
    let Harness { context, drafts, .. } = harness();
    let mut session = context.author(quiz_kind());
    let key = session.draft_keys().title.clone();

    // Act
    session.set_title("A");
    tokio::time::sleep(Duration::from_millis(1000)).await;
    session.set_title("AB");
    tokio::time::sleep(Duration::from_millis(1000)).await;
    session.set_title("ABC");

    // Assert
    tokio::time::sleep(Duration::from_millis(4999)).await;
    assert!(drafts.writes_to(&key).is_empty());
    assert!(!session.is_saving());

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(drafts.writes_to(&key), vec!["ABC".to_string()]);
    assert!(session.is_saving());
}

#[tokio::test(start_paused = true)]
async fn saving_indicator_is_not_extended_by_edits() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut session = context.author(quiz_kind());
    session.set_title("First");
    tokio::time::sleep(Duration::from_millis(5001)).await;
    assert!(session.is_saving());

    // Act
    tokio::time::sleep(Duration::from_millis(1000)).await;
    session.set_title("Second");

    // Assert
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(!session.is_saving());
}

#[tokio::test(start_paused = true)]
async fn fields_have_independent_timers() {
    // Arrange
    let Harness { context, drafts, .. } = harness();
    let mut session = context.author(quiz_kind());
    let keys = session.draft_keys().clone();

    // Act
    session.set_title("Title");
    tokio::time::sleep(Duration::from_millis(4000)).await;
    session
        .set_item_field(0, ItemField::Question("Q".into()))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    // Assert
    assert_eq!(drafts.writes_to(&keys.title), vec!["Title".to_string()]);
    assert!(drafts.writes_to(&keys.items).is_empty());

    tokio::time::sleep(Duration::from_millis(4000)).await;
    assert_eq!(drafts.writes_to(&keys.items).len(), 1);
}

#[tokio::test]
async fn closing_flushes_and_a_new_session_restores() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut first = context.author(quiz_kind());
    first.set_title("Half done");
    first.add_item();
    first
        .set_item_field(1, ItemField::Question("Second question".into()))
        .unwrap();
    first.close().await;

    // Act
    let mut second = context.author(quiz_kind());
    let restored = second.restore_draft().await.unwrap();

    // Assert
    assert!(restored);
    assert_eq!(second.assessment().title, "Half done");
    assert_eq!(second.items().len(), 2);
    assert_eq!(second.items()[1].question, "Second question");
}

#[tokio::test]
async fn nothing_to_restore_leaves_session_untouched() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut session = context.author(AssessmentKind::ReadingTest);

    // Act
    let restored = session.restore_draft().await.unwrap();

    // Assert
    assert!(!restored);
    assert_eq!(session.items().len(), 1);
    assert_eq!(session.assessment().title, "");
}

#[tokio::test]
async fn publishing_clears_the_draft() {
    // Arrange
    let Harness { context, drafts, .. } = harness();
    let mut session = context.author(quiz_kind());
    session.set_title("Ready");
    fill_multiple_choice(&mut session, 0, "2 + 2?", &["3", "4"], 1);
    session.flush_drafts().await;
    let keys = session.draft_keys().clone();
    assert_eq!(drafts.value(&keys.title).as_deref(), Some("Ready"));

    // Act
    session.publish().await.unwrap();

    // Assert
    assert_eq!(drafts.value(&keys.title), None);
    assert_eq!(drafts.value(&keys.items), None);
}

#[tokio::test]
async fn editing_loads_stored_content() {
    // Arrange
    let Harness { context, store, .. } = harness();
    store.insert_assessment(
        quiz_ref(7),
        json!({
            "quiz_title": "Stored",
            "quiz_desc": "From the backend",
            "quiz_status": "1",
            "questions": [
                {
                    "question_id": 70,
                    "question": "Largest planet?",
                    "question_type": "multipleChoice",
                    "choices": ["Mars", "Jupiter"],
                    "answer": "Jupiter",
                    "is_plain": true
                },
                {
                    "question_id": 71,
                    "question": "<p>Sun is a star</p>",
                    "question_type": "trueFalse",
                    "answer": "True",
                    "is_plain": false
                }
            ]
        }),
    );

    // Act
    let session = context
        .edit(quiz_kind(), Identifier::Number(7))
        .await
        .unwrap();

    // Assert
    assert_eq!(session.assessment().title, "Stored");
    assert!(session.assessment().is_published());
    assert_eq!(session.items()[0].answer_index(), Some(1));
    assert_eq!(session.items()[1].body, AnswerBody::TrueFalse { answer: Some(true) });
    assert_eq!(session.draft_keys().title, "quiz:9:7:title");
}

#[tokio::test]
async fn editing_a_missing_assessment_reports_the_failure() {
    // Arrange
    let Harness { context, .. } = harness();
    let mut session = AuthoringSession::new(
        quiz_kind(),
        Some(Identifier::Number(404)),
        context.store.clone(),
        context.drafts.clone(),
        &context.config,
    );

    // Act
    let result = session.load().await;

    // Assert
    assert!(matches!(result, Err(AppError::Persistence(_))));
    assert_eq!(session.notice().unwrap().tone, Tone::Danger);
    assert_eq!(session.items().len(), 1);
}

#[tokio::test]
async fn long_titles_save_as_draft() {
    // Arrange
    let Harness { context, store, .. } = harness();
    let mut session = context.author(quiz_kind());
    let title = "T".repeat(256);
    session.set_title(&title);

    // Act
    let outcome = session.save_as_draft().await;

    // Assert
    assert!(matches!(outcome, Ok(SaveOutcome::Saved { .. })));
    let sent = store.saves_json();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["quiz_title"], title.as_str());
}

#[tokio::test]
async fn image_only_question_can_be_published() {
    // Arrange
    let Harness { context, store, .. } = harness();
    let mut session = context.author(quiz_kind());
    session.set_title("Organelles");
    fill_multiple_choice(&mut session, 0, "placeholder", &["Nucleus", "Ribosome"], 0);
    session
        .set_item_field(0, ItemField::PlainText(false))
        .unwrap();
    session
        .set_item_field(
            0,
            ItemField::Question("<p><img src=\"https://x/cell.png\"></p>".into()),
        )
        .unwrap();

    // Act
    let outcome = session.publish().await.unwrap();

    // Assert
    assert!(matches!(
        outcome,
        SaveOutcome::Saved {
            status: Status::Published,
            ..
        }
    ));
    assert!(session.item(0).unwrap().errors.question_error.is_none());
    assert_eq!(store.saves().len(), 1);
}

#[tokio::test]
async fn first_save_moves_draft_off_the_new_keys() {
    // Arrange
    let Harness { context, drafts, .. } = harness();
    let mut session = context.author(quiz_kind());
    session.set_title("Saved once");
    session.flush_drafts().await;
    let new_keys = session.draft_keys().clone();
    assert_eq!(drafts.value(&new_keys.title).as_deref(), Some("Saved once"));

    // Act
    session.save_as_draft().await.unwrap();
    session.flush_drafts().await;

    // Assert
    assert_eq!(drafts.value(&new_keys.title), None);
    assert_eq!(drafts.value(&new_keys.items), None);
    assert_eq!(session.draft_keys().title, "quiz:9:500:title");
    assert_eq!(
        drafts.value(&session.draft_keys().title).as_deref(),
        Some("Saved once")
    );

    let mut next_new = context.author(quiz_kind());
    assert!(!next_new.restore_draft().await.unwrap());
}
