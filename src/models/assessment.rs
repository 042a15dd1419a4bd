// src/models/assessment.rs

use serde::{Deserialize, Serialize};

use crate::models::item::Item;
use crate::models::payload::Identifier;

/// Lifecycle state. `None` on an assessment means it was never saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Draft,
    Published,
}

impl Status {
    /// Backend encodes publication as a numeric flag.
    pub fn from_code(code: i64) -> Self {
        if code == 1 {
            Status::Published
        } else {
            Status::Draft
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Status::Draft => 0,
            Status::Published => 1,
        }
    }
}

/// Quiz attached to a learning module, or a reading-comprehension test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentKind {
    Quiz { module_id: Identifier },
    ReadingTest,
}

impl AssessmentKind {
    /// Human noun for notices.
    pub fn noun(&self) -> &'static str {
        match self {
            AssessmentKind::Quiz { .. } => "quiz",
            AssessmentKind::ReadingTest => "test",
        }
    }

    /// Reading tests must carry their passage text.
    pub fn requires_text(&self) -> bool {
        matches!(self, AssessmentKind::ReadingTest)
    }

    /// `result_type` reported with a graded submission.
    pub fn result_type(&self) -> i64 {
        match self {
            AssessmentKind::Quiz { .. } => 1,
            AssessmentKind::ReadingTest => 2,
        }
    }
}

/// A quiz or test: title, optional description/passage, ordered items.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub id: Option<Identifier>,
    pub kind: AssessmentKind,
    pub title: String,
    /// Quiz description, or the reading test's passage.
    pub description_or_text: String,
    pub items: Vec<Item>,
    pub status: Option<Status>,
}

impl Assessment {
    /// A new, unsaved assessment holding one blank multiple-choice item.
    pub fn new(kind: AssessmentKind) -> Self {
        Self {
            id: None,
            kind,
            title: String::new(),
            description_or_text: String::new(),
            items: vec![Item::default()],
            status: None,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == Some(Status::Published)
    }

    /// Assigns the i-th returned id to the i-th item.
    ///
    /// Ids already present are overwritten. A length mismatch means the store
    /// broke the ordering contract; the overlapping prefix is still merged.
    pub fn merge_item_ids(&mut self, ids: &[Identifier]) {
        if ids.len() != self.items.len() {
            tracing::warn!(
                "Store returned {} item ids for {} items",
                ids.len(),
                self.items.len()
            );
        }

        for (item, id) in self.items.iter_mut().zip(ids) {
            item.id = Some(id.clone());
        }
    }
}
