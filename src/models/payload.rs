// src/models/payload.rs
//
// Wire shapes of the remote LMS API. Field names follow the existing backend.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::MIN_CHOICE_COUNT;
use crate::error::AppError;
use crate::models::{
    assessment::{Assessment, AssessmentKind, Status},
    item::{AnswerBody, Item, QuestionType, parse_true_false},
};

/// Backend identifiers arrive as either numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{}", n),
            Identifier::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Identifier::Number(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Text(value.to_string())
    }
}

/// Loosely typed scalar (`1` vs `"1"`, `0` vs `"True"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Scalar::Int(n) => n.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

/// Names one assessment on the wire: `{"quiz_id": ..}` or `{"test_id": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentRef {
    QuizId(Identifier),
    TestId(Identifier),
}

impl AssessmentRef {
    pub fn for_kind(kind: &AssessmentKind, id: Identifier) -> Self {
        match kind {
            AssessmentKind::Quiz { .. } => AssessmentRef::QuizId(id),
            AssessmentKind::ReadingTest => AssessmentRef::TestId(id),
        }
    }
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

/// One item as sent to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<Identifier>,
    pub question: String,
    pub is_plain: bool,
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    pub answer: String,
}

impl From<&Item> for ItemPayload {
    fn from(item: &Item) -> Self {
        let choices = match &item.body {
            AnswerBody::MultipleChoice { choices, .. } => Some(choices.clone()),
            _ => None,
        };

        Self {
            question_id: item.id.clone(),
            question: item.question.clone(),
            is_plain: item.is_plain_text,
            question_type: item.question_type(),
            choices,
            answer: item.effective_answer(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct QuizPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<Identifier>,
    #[validate(length(min = 1))]
    pub quiz_title: String,
    pub quiz_desc: String,
    #[validate(length(min = 1))]
    pub items: Vec<ItemPayload>,
    pub module_id: Identifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_status: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct TestPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_id: Option<Identifier>,
    #[validate(length(min = 1))]
    pub test_title: String,
    pub test_text: String,
    #[validate(length(min = 1))]
    pub items: Vec<ItemPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_status: Option<i64>,
}

/// Body of `saveAssessment`. `status` is present only when publishing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SavePayload {
    Quiz(QuizPayload),
    Test(TestPayload),
}

impl SavePayload {
    pub fn build(assessment: &Assessment, status: Option<Status>) -> Self {
        let items: Vec<ItemPayload> = assessment.items.iter().map(ItemPayload::from).collect();
        let status = status.map(|s| s.code());

        match &assessment.kind {
            AssessmentKind::Quiz { module_id } => SavePayload::Quiz(QuizPayload {
                quiz_id: assessment.id.clone(),
                quiz_title: assessment.title.clone(),
                quiz_desc: assessment.description_or_text.clone(),
                items,
                module_id: module_id.clone(),
                quiz_status: status,
            }),
            AssessmentKind::ReadingTest => SavePayload::Test(TestPayload {
                test_id: assessment.id.clone(),
                test_title: assessment.title.clone(),
                test_text: assessment.description_or_text.clone(),
                items,
                test_status: status,
            }),
        }
    }

    pub fn items(&self) -> &[ItemPayload] {
        match self {
            SavePayload::Quiz(p) => &p.items,
            SavePayload::Test(p) => &p.items,
        }
    }

    pub fn is_publish(&self) -> bool {
        match self {
            SavePayload::Quiz(p) => p.quiz_status.is_some(),
            SavePayload::Test(p) => p.test_status.is_some(),
        }
    }

    /// Last guard before the payload leaves the process.
    pub fn check(&self) -> Result<(), AppError> {
        match self {
            SavePayload::Quiz(p) => p.validate()?,
            SavePayload::Test(p) => p.validate()?,
        }
        Ok(())
    }
}

/// Reply of `saveAssessment`: the assessment id plus item ids in payload order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "quiz_id", alias = "test_id")]
    pub id: Option<Identifier>,
    #[serde(default)]
    pub items: Vec<Identifier>,
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// One item as returned by `fetchAssessment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDto {
    #[serde(default, alias = "question_id", alias = "questionID")]
    pub id: Option<Identifier>,
    #[serde(alias = "questionHTML")]
    pub question: String,
    #[serde(alias = "questionType")]
    pub question_type: String,
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    #[serde(default, alias = "answerIndex")]
    pub answer_index: Option<usize>,
    #[serde(default)]
    pub answer: Option<Scalar>,
    #[serde(default, alias = "isPlainText")]
    pub is_plain: Option<bool>,
}

impl ItemDto {
    pub fn into_item(self) -> Result<Item, AppError> {
        let question_type = QuestionType::parse(&self.question_type).ok_or_else(|| {
            AppError::Persistence(format!("Unknown question type '{}'", self.question_type))
        })?;

        let body = match question_type {
            QuestionType::MultipleChoice => {
                let mut choices = self.choices.unwrap_or_default();
                while choices.len() < MIN_CHOICE_COUNT {
                    choices.push(String::new());
                }
                // Stored answers are choice texts; an explicit index wins when present.
                let answer_index = self
                    .answer_index
                    .filter(|i| *i < choices.len())
                    .or_else(|| match &self.answer {
                        Some(Scalar::Text(text)) if !text.is_empty() => {
                            choices.iter().position(|c| c == text)
                        }
                        _ => None,
                    });
                AnswerBody::MultipleChoice {
                    choices,
                    answer_index,
                }
            }
            QuestionType::TrueFalse => AnswerBody::TrueFalse {
                answer: match &self.answer {
                    Some(Scalar::Text(text)) => parse_true_false(text),
                    Some(Scalar::Int(0)) => Some(true),
                    Some(Scalar::Int(1)) => Some(false),
                    _ => None,
                },
            },
            QuestionType::Identification => AnswerBody::Identification {
                answer: self.answer.map(Scalar::into_text).unwrap_or_default(),
            },
        };

        Ok(Item {
            id: self.id,
            question: self.question,
            is_plain_text: self.is_plain.unwrap_or(true),
            body,
            errors: Default::default(),
        })
    }
}

/// Reply of `fetchAssessment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentDto {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
    #[serde(default, alias = "quiz_title", alias = "test_title")]
    pub title: String,
    #[serde(default, alias = "quiz_desc", alias = "test_text")]
    pub description_or_text: Option<String>,
    #[serde(default)]
    pub questions: Vec<ItemDto>,
    #[serde(default, alias = "quiz_status", alias = "test_status")]
    pub status: Option<Scalar>,
}

impl AssessmentDto {
    /// Turns a fetched record into the model. A `success: false` reply is an error.
    pub fn into_assessment(
        self,
        id: Identifier,
        kind: AssessmentKind,
    ) -> Result<Assessment, AppError> {
        if self.success == Some(false) {
            return Err(AppError::Persistence(
                self.message
                    .unwrap_or_else(|| format!("Failed to load {} data.", kind.noun())),
            ));
        }

        let items = self
            .questions
            .into_iter()
            .map(ItemDto::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Assessment {
            id: Some(id),
            kind,
            title: self.title,
            description_or_text: self.description_or_text.unwrap_or_default(),
            items,
            status: self.status.and_then(|s| s.as_int()).map(Status::from_code),
        })
    }
}

// ---------------------------------------------------------------------------
// Learners and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerIdResponse {
    pub id_number: String,
}

/// Graded submission sent to `submitResult`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPayload {
    pub student_id: String,
    #[serde(flatten)]
    pub target: AssessmentRef,
    /// `"score/total"`.
    #[serde(rename = "totalScore")]
    pub total_score: String,
    pub remarks: String,
    pub result_type: i64,
}

/// Generic `{success, message?}` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreReply {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl StoreReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// `Err(Persistence)` carrying the store's message, or `fallback`.
    pub fn into_result(self, fallback: &str) -> Result<(), AppError> {
        if self.success {
            Ok(())
        } else {
            Err(AppError::Persistence(
                self.message.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}
