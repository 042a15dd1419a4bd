// src/models/submission.rs

use serde::{Deserialize, Serialize};

use crate::models::item::{AnswerBody, Item};

/// A learner's answer to one displayed question.
///
/// True/false answers are choice indices too: `0` is "True", `1` is "False".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionAnswer {
    Choice(usize),
    Text(String),
}

/// The correct answer of an item in the representation learners answer with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerKey {
    Choice(usize),
    Text(String),
}

impl AnswerKey {
    /// `None` when the item has no answer set; such an item can never be scored.
    pub fn for_item(item: &Item) -> Option<Self> {
        match &item.body {
            AnswerBody::MultipleChoice { answer_index, .. } => answer_index.map(AnswerKey::Choice),
            AnswerBody::TrueFalse { answer } => {
                answer.map(|value| AnswerKey::Choice(if value { 0 } else { 1 }))
            }
            AnswerBody::Identification { answer } => Some(AnswerKey::Text(answer.clone())),
        }
    }

    /// Index compares with index, text with text. Mixed representations never match.
    pub fn matches(&self, answer: &SubmissionAnswer) -> bool {
        match (self, answer) {
            (AnswerKey::Choice(expected), SubmissionAnswer::Choice(given)) => expected == given,
            (AnswerKey::Text(expected), SubmissionAnswer::Text(given)) => expected == given,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Remark {
    Passed,
    Failed,
}

impl Remark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Remark::Passed => "Passed",
            Remark::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    pub score: usize,
    pub total: usize,
    pub passing_score: usize,
    pub remark: Remark,
    /// Correctness per display position.
    pub correct: Vec<bool>,
}

impl GradeReport {
    /// `"score/total"` as the backend stores it.
    pub fn score_label(&self) -> String {
        format!("{}/{}", self.score, self.total)
    }
}

/// `ceil(total * ratio)`.
pub fn passing_score(total: usize, ratio: f64) -> usize {
    (total as f64 * ratio).ceil() as usize
}

/// Scores answers against keys position by position.
///
/// An empty assessment always fails: there is nothing the learner could
/// have demonstrated.
pub fn grade(
    keys: &[Option<AnswerKey>],
    answers: &[Option<SubmissionAnswer>],
    passing_ratio: f64,
) -> GradeReport {
    let correct: Vec<bool> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| match (key, answers.get(i).and_then(Option::as_ref)) {
            (Some(key), Some(answer)) => key.matches(answer),
            _ => false,
        })
        .collect();

    let total = keys.len();
    let score = correct.iter().filter(|c| **c).count();
    let passing_score = passing_score(total, passing_ratio);

    let remark = if total > 0 && score >= passing_score {
        Remark::Passed
    } else {
        Remark::Failed
    };

    GradeReport {
        score,
        total,
        passing_score,
        remark,
        correct,
    }
}
