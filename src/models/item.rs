// src/models/item.rs

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_CHOICE_COUNT;
use crate::models::payload::Identifier;

/// Question type, serialized with the names the backend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "multipleChoice")]
    MultipleChoice,
    #[serde(rename = "trueFalse")]
    TrueFalse,
    #[serde(rename = "identification")]
    Identification,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multipleChoice",
            QuestionType::TrueFalse => "trueFalse",
            QuestionType::Identification => "identification",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "multipleChoice" => Some(QuestionType::MultipleChoice),
            "trueFalse" => Some(QuestionType::TrueFalse),
            "identification" => Some(QuestionType::Identification),
            _ => None,
        }
    }
}

/// Type-specific answer data. Exactly one representation is authoritative per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "questionType")]
pub enum AnswerBody {
    #[serde(rename = "multipleChoice", rename_all = "camelCase")]
    MultipleChoice {
        choices: Vec<String>,
        answer_index: Option<usize>,
    },
    #[serde(rename = "trueFalse")]
    TrueFalse { answer: Option<bool> },
    #[serde(rename = "identification")]
    Identification { answer: String },
}

impl AnswerBody {
    /// Fresh answer data for a newly selected question type.
    pub fn blank(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::MultipleChoice => AnswerBody::MultipleChoice {
                choices: vec![String::new(); DEFAULT_CHOICE_COUNT],
                answer_index: None,
            },
            QuestionType::TrueFalse => AnswerBody::TrueFalse { answer: None },
            QuestionType::Identification => AnswerBody::Identification {
                answer: String::new(),
            },
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerBody::MultipleChoice { .. } => QuestionType::MultipleChoice,
            AnswerBody::TrueFalse { .. } => QuestionType::TrueFalse,
            AnswerBody::Identification { .. } => QuestionType::Identification,
        }
    }
}

/// The three independent inline error slots of one item. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemErrors {
    pub question_error: Option<String>,
    pub answer_error: Option<String>,
    pub choices_error: Option<String>,
}

impl ItemErrors {
    pub fn is_empty(&self) -> bool {
        self.question_error.is_none() && self.answer_error.is_none() && self.choices_error.is_none()
    }

    pub fn clear(&mut self) {
        *self = ItemErrors::default();
    }
}

/// One question of an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "questionID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,

    /// Question body: rich-text markup unless `is_plain_text`.
    #[serde(rename = "questionHTML")]
    pub question: String,

    pub is_plain_text: bool,

    #[serde(flatten)]
    pub body: AnswerBody,

    #[serde(skip)]
    pub errors: ItemErrors,
}

impl Default for Item {
    fn default() -> Self {
        Self {
            id: None,
            question: String::new(),
            is_plain_text: true,
            body: AnswerBody::blank(QuestionType::MultipleChoice),
            errors: ItemErrors::default(),
        }
    }
}

impl Item {
    pub fn question_type(&self) -> QuestionType {
        self.body.question_type()
    }

    /// Choice list for multiple-choice items, empty otherwise.
    pub fn choices(&self) -> &[String] {
        match &self.body {
            AnswerBody::MultipleChoice { choices, .. } => choices,
            _ => &[],
        }
    }

    pub fn answer_index(&self) -> Option<usize> {
        match &self.body {
            AnswerBody::MultipleChoice { answer_index, .. } => *answer_index,
            _ => None,
        }
    }

    /// The authoritative correct answer in its wire form.
    ///
    /// Multiple choice derives it from `choices[answer_index]` every time it is
    /// asked; nothing stores it alongside the index. Unset answers are `""`.
    pub fn effective_answer(&self) -> String {
        match &self.body {
            AnswerBody::MultipleChoice {
                choices,
                answer_index,
            } => answer_index
                .and_then(|i| choices.get(i))
                .cloned()
                .unwrap_or_default(),
            AnswerBody::TrueFalse { answer } => answer
                .map(|value| true_false_label(value).to_string())
                .unwrap_or_default(),
            AnswerBody::Identification { answer } => answer.clone(),
        }
    }
}

pub fn true_false_label(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

pub fn parse_true_false(raw: &str) -> Option<bool> {
    match raw {
        "True" => Some(true),
        "False" => Some(false),
        _ => None,
    }
}
