// src/services/catalog.rs

use std::sync::Arc;

use chrono::NaiveDate;
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    assessment::Status,
    catalog::{AssessmentSummary, Audience, BatchAssignment, ExpiryPayload, SummaryDto},
    payload::{AssessmentRef, Identifier},
};
use crate::services::store::AssessmentStore;

/// Listing and housekeeping operations around assessments.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn AssessmentStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn AssessmentStore>) -> Self {
        Self { store }
    }

    /// Quizzes of one module. Learners only see published ones.
    pub async fn list_quizzes(
        &self,
        module_id: &Identifier,
        audience: Audience,
    ) -> Result<Vec<AssessmentSummary>, AppError> {
        let rows = self.store.list_quizzes(module_id).await.map_err(|e| {
            tracing::error!("Failed to fetch quizzes of module {}: {:?}", module_id, e);
            e
        })?;
        Ok(visible_to(rows, audience))
    }

    /// Reading-comprehension tests. Learners only see published ones.
    pub async fn list_tests(&self, audience: Audience) -> Result<Vec<AssessmentSummary>, AppError> {
        let rows = self.store.list_tests().await.map_err(|e| {
            tracing::error!("Failed to fetch reading tests: {:?}", e);
            e
        })?;
        Ok(visible_to(rows, audience))
    }

    pub async fn delete(&self, target: &AssessmentRef) -> Result<(), AppError> {
        let reply = self.store.delete_assessment(target).await.map_err(|e| {
            tracing::error!("Failed to delete {:?}: {:?}", target, e);
            e
        })?;
        reply.into_result("An error occurred while deleting.")?;
        tracing::info!("Deleted {:?}", target);
        Ok(())
    }

    /// Sets the last day a quiz can be taken. Past dates are refused.
    pub async fn set_expiry(
        &self,
        quiz_id: &Identifier,
        expiry_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<(), AppError> {
        let expiry_date = expiry_date
            .ok_or_else(|| AppError::Validation("Expiry date is required.".to_string()))?;

        if expiry_date < today {
            return Err(AppError::Validation(
                "Expiry date cannot be in the past.".to_string(),
            ));
        }

        let payload = ExpiryPayload {
            quiz_id: quiz_id.clone(),
            expiry_date: expiry_date.format("%Y-%m-%d").to_string(),
        };

        let reply = self.store.set_expiry(&payload).await.map_err(|e| {
            tracing::error!("Error setting expiry date: {:?}", e);
            e
        })?;
        reply.into_result("An error occurred.")
    }

    /// Assigns a reading test to a student batch, once.
    pub async fn assign_to_batch(&self, test_id: &Identifier, batch_id: &str) -> Result<(), AppError> {
        let assignment = BatchAssignment {
            test_id: test_id.clone(),
            batch_id: batch_id.trim().to_string(),
        };
        assignment.validate()?;

        let existing = self.store.check_assignment(&assignment).await.map_err(|e| {
            tracing::error!("Error checking assignment: {:?}", e);
            AppError::Persistence("Unable to validate assignment. Please try again.".to_string())
        })?;
        if existing.success {
            return Err(AppError::Conflict(format!(
                "Test {} is already assigned to batch {}",
                test_id, assignment.batch_id
            )));
        }

        let reply = self.store.assign_to_batch(&assignment).await.map_err(|e| {
            tracing::error!("Error assigning test to batch: {:?}", e);
            e
        })?;
        reply.into_result("An error occurred while assigning test.")?;
        tracing::info!("Assigned test {} to batch {}", test_id, assignment.batch_id);
        Ok(())
    }
}

fn visible_to(rows: Vec<SummaryDto>, audience: Audience) -> Vec<AssessmentSummary> {
    rows.into_iter()
        .map(AssessmentSummary::from)
        .filter(|summary| audience == Audience::Coordinator || summary.status == Status::Published)
        .collect()
}
