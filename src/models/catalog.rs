// src/models/catalog.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    assessment::Status,
    payload::{Identifier, Scalar},
};

/// Who is looking at a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Coordinator,
    Learner,
}

/// Row of `getQuizzes` / `getReadCompreTests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryDto {
    #[serde(alias = "quiz_id", alias = "test_id")]
    pub id: Identifier,
    #[serde(alias = "quiz_title", alias = "test_title")]
    pub title: String,
    #[serde(default)]
    pub no_of_items: Option<i64>,
    #[serde(default, alias = "quiz_time", alias = "test_time")]
    pub time: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default, alias = "quiz_status", alias = "test_status")]
    pub status: Option<Scalar>,
    #[serde(default)]
    pub date_added: Option<String>,
}

/// Listing entry as the engine exposes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentSummary {
    pub id: Identifier,
    pub title: String,
    pub item_count: usize,
    /// Time limit as the backend formats it, e.g. `00:15:00`.
    pub time_limit: Option<String>,
    pub status: Status,
    pub expiry_date: Option<NaiveDate>,
    pub date_added: Option<String>,
}

impl From<SummaryDto> for AssessmentSummary {
    fn from(dto: SummaryDto) -> Self {
        let expiry_date = dto
            .expiry_date
            .as_deref()
            .and_then(|raw| raw.get(..10))
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok());

        Self {
            id: dto.id,
            title: dto.title,
            item_count: dto.no_of_items.unwrap_or(0).max(0) as usize,
            time_limit: dto.time.filter(|t| !t.trim().is_empty()),
            status: dto
                .status
                .and_then(|s| s.as_int())
                .map(Status::from_code)
                .unwrap_or(Status::Draft),
            expiry_date,
            date_added: dto.date_added,
        }
    }
}

/// Body of `setExpiryDate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiryPayload {
    pub quiz_id: Identifier,
    /// `YYYY-MM-DD`
    pub expiry_date: String,
}

/// Body of `checkAssignment` / `assignTestToBatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct BatchAssignment {
    pub test_id: Identifier,
    #[validate(length(min = 1, message = "Please select a batch."))]
    pub batch_id: String,
}
