// src/services/store.rs

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    catalog::{BatchAssignment, ExpiryPayload, SummaryDto},
    payload::{
        AssessmentDto, AssessmentRef, Identifier, ResultPayload, SavePayload, SaveResponse,
        StoreReply,
    },
};

/// The remote LMS backend.
///
/// Transport failures come back as `Err(AppError::Persistence)`. A reply with
/// `success: false` is still `Ok`; the caller decides what it means.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// `GET quiz/getQuizData/{id}` or the reading-test equivalent.
    async fn fetch_assessment(&self, target: &AssessmentRef) -> Result<AssessmentDto, AppError>;

    /// `POST quiz/saveQuiz` / `read_compre_test/saveTest`.
    ///
    /// `items` in the reply follow the order of `payload.items`.
    async fn save_assessment(&self, payload: &SavePayload) -> Result<SaveResponse, AppError>;

    async fn delete_assessment(&self, target: &AssessmentRef) -> Result<StoreReply, AppError>;

    /// `POST quiz/submitQuiz`.
    async fn submit_result(&self, payload: &ResultPayload) -> Result<StoreReply, AppError>;

    async fn list_quizzes(&self, module_id: &Identifier) -> Result<Vec<SummaryDto>, AppError>;

    async fn list_tests(&self) -> Result<Vec<SummaryDto>, AppError>;

    async fn set_expiry(&self, payload: &ExpiryPayload) -> Result<StoreReply, AppError>;

    /// `success: true` means the test is already assigned to that batch.
    async fn check_assignment(&self, payload: &BatchAssignment) -> Result<StoreReply, AppError>;

    async fn assign_to_batch(&self, payload: &BatchAssignment) -> Result<StoreReply, AppError>;
}
