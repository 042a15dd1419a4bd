// src/session/grading.rs

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    assessment::{AssessmentKind, Status},
    item::{Item, QuestionType},
    payload::{AssessmentRef, Identifier, ResultPayload},
    submission::{AnswerKey, GradeReport, SubmissionAnswer, grade},
};
use crate::services::identity::{IdentityProvider, LearnerDirectory};
use crate::services::store::AssessmentStore;
use crate::utils::html::clean_html;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    InProgress,
    Submitted,
}

/// One question as shown to the learner. The answer key travels with it.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    /// Sanitised markup, or the plain text as written.
    pub question: String,
    pub is_plain_text: bool,
    pub question_type: QuestionType,
    pub choices: Vec<String>,
    /// Position in authoring order.
    pub original_index: usize,
    key: Option<AnswerKey>,
}

impl DisplayItem {
    fn from_item(original_index: usize, item: &Item) -> Self {
        let question = if item.is_plain_text {
            item.question.clone()
        } else {
            clean_html(&item.question)
        };

        Self {
            question,
            is_plain_text: item.is_plain_text,
            question_type: item.question_type(),
            choices: item.choices().to_vec(),
            original_index,
            key: AnswerKey::for_item(item),
        }
    }

    pub fn answer_key(&self) -> Option<&AnswerKey> {
        self.key.as_ref()
    }
}

/// One learner taking one published assessment.
pub struct GradingSession {
    store: Arc<dyn AssessmentStore>,
    identity: Arc<dyn IdentityProvider>,
    learners: Arc<dyn LearnerDirectory>,
    rng: StdRng,
    passing_ratio: f64,

    phase: Phase,
    target: Option<AssessmentRef>,
    kind: Option<AssessmentKind>,
    title: String,
    description_or_text: String,
    items: Vec<DisplayItem>,
    answers: Vec<Option<SubmissionAnswer>>,
    cursor: usize,
    learner_id: Option<String>,
    error: Option<String>,
    report: Option<GradeReport>,
}

impl GradingSession {
    pub fn new(
        store: Arc<dyn AssessmentStore>,
        identity: Arc<dyn IdentityProvider>,
        learners: Arc<dyn LearnerDirectory>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            identity,
            learners,
            rng: StdRng::from_os_rng(),
            passing_ratio: config.passing_ratio,
            phase: Phase::Loading,
            target: None,
            kind: None,
            title: String::new(),
            description_or_text: String::new(),
            items: Vec::new(),
            answers: Vec::new(),
            cursor: 0,
            learner_id: None,
            error: None,
            report: None,
        }
    }

    /// Replaces the random source, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description_or_text(&self) -> &str {
        &self.description_or_text
    }

    pub fn display_items(&self) -> &[DisplayItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_item(&self) -> Option<&DisplayItem> {
        self.items.get(self.cursor)
    }

    pub fn answer(&self, display_index: usize) -> Option<&SubmissionAnswer> {
        self.answers.get(display_index).and_then(Option::as_ref)
    }

    pub fn learner_id(&self) -> Option<&str> {
        self.learner_id.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn report(&self) -> Option<&GradeReport> {
        self.report.as_ref()
    }

    pub fn can_go_previous(&self) -> bool {
        self.phase == Phase::InProgress && self.cursor > 0
    }

    /// On the last question "Next" turns into "Submit".
    pub fn is_last(&self) -> bool {
        self.cursor + 1 >= self.items.len()
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Resolves the learner id and loads the assessment.
    pub async fn start(&mut self, kind: AssessmentKind, id: Identifier) -> Result<(), AppError> {
        self.load_for_taking(kind, id).await?;
        self.resolve_learner().await
    }

    /// Looks up the signed-in account's student id. Done once per session.
    pub async fn resolve_learner(&mut self) -> Result<(), AppError> {
        if self.learner_id.is_some() {
            return Ok(());
        }

        let account = self.identity.current_account().ok_or_else(|| {
            AppError::PrerequisiteMissing("No signed-in account".to_string())
        })?;

        match self.learners.lookup_learner_id(&account).await {
            Ok(response) => {
                self.learner_id = Some(response.id_number);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to fetch student ID: {:?}", e);
                self.error = Some("Failed to fetch student ID. Please try again later.".to_string());
                Err(e)
            }
        }
    }

    /// Fetches a published assessment and fixes its display order for this session.
    pub async fn load_for_taking(&mut self, kind: AssessmentKind, id: Identifier) -> Result<(), AppError> {
        self.phase = Phase::Loading;
        self.error = None;

        let target = AssessmentRef::for_kind(&kind, id.clone());
        let loaded = match self.store.fetch_assessment(&target).await {
            Ok(dto) => dto.into_assessment(id, kind.clone()),
            Err(e) => Err(e),
        };

        let assessment = match loaded {
            Ok(assessment) if assessment.status == Some(Status::Draft) => {
                let e = AppError::PrerequisiteMissing(format!(
                    "{:?} is not published",
                    target
                ));
                tracing::warn!("Refusing to start unpublished {:?}", target);
                self.error = Some(format!("This {} is not available yet.", kind.noun()));
                return Err(e);
            }
            Ok(assessment) => assessment,
            Err(e) => {
                tracing::error!("Failed to load {:?}: {:?}", target, e);
                self.error = Some(format!(
                    "Failed to load {} data. Please try again later.",
                    kind.noun()
                ));
                return Err(e);
            }
        };

        let mut items: Vec<DisplayItem> = assessment
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| DisplayItem::from_item(i, item))
            .collect();
        // Whole records move, so each answer key stays with its question.
        items.shuffle(&mut self.rng);

        tracing::info!("Loaded {:?} for taking, {} questions", target, items.len());

        self.answers = vec![None; items.len()];
        self.items = items;
        self.cursor = 0;
        self.title = assessment.title;
        self.description_or_text = assessment.description_or_text;
        self.target = Some(target);
        self.kind = Some(kind);
        self.report = None;
        self.phase = Phase::InProgress;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Taking
    // -----------------------------------------------------------------------

    pub fn next(&mut self) -> bool {
        if self.phase == Phase::InProgress && !self.is_last() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.can_go_previous() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Stores an answer for a display position, replacing any earlier one.
    pub fn record_answer(&mut self, display_index: usize, answer: SubmissionAnswer) -> Result<(), AppError> {
        self.ensure_in_progress()?;
        let slot = self.answers.get_mut(display_index).ok_or_else(|| {
            AppError::NotFound(format!("Question {} does not exist", display_index))
        })?;
        *slot = Some(answer);
        Ok(())
    }

    /// Answers the question under the cursor.
    pub fn answer_current(&mut self, answer: SubmissionAnswer) -> Result<(), AppError> {
        self.record_answer(self.cursor, answer)
    }

    /// Scores the answers recorded so far without submitting.
    pub fn preview(&self) -> GradeReport {
        let keys: Vec<Option<AnswerKey>> = self.items.iter().map(|item| item.key.clone()).collect();
        grade(&keys, &self.answers, self.passing_ratio)
    }

    /// Grades and reports the result. Answers stay in memory if the store fails.
    pub async fn submit(&mut self) -> Result<GradeReport, AppError> {
        if self.phase == Phase::Submitted {
            return Err(AppError::Conflict("This quiz has already been submitted".to_string()));
        }

        let ready = match (&self.learner_id, &self.target, &self.kind, self.phase) {
            (Some(learner_id), Some(target), Some(kind), Phase::InProgress) => {
                Some((learner_id.clone(), target.clone(), kind.result_type()))
            }
            _ => None,
        };
        let Some((student_id, target, result_type)) = ready else {
            self.error = Some("Quiz data or student ID is missing.".to_string());
            return Err(AppError::PrerequisiteMissing(
                "Quiz data or student ID is missing.".to_string(),
            ));
        };

        let report = self.preview();
        let payload = ResultPayload {
            student_id,
            target,
            total_score: report.score_label(),
            remarks: report.remark.as_str().to_string(),
            result_type,
        };

        let reply = match self.store.submit_result(&payload).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Failed to submit {:?}: {:?}", payload.target, e);
                self.error = Some("Unexpected error. Please try again.".to_string());
                return Err(e);
            }
        };

        if !reply.success {
            tracing::error!("Store rejected submission of {:?}: {:?}", payload.target, reply.message);
            self.error = Some("Quiz submission failed. Please try again.".to_string());
            return Err(AppError::Persistence(
                reply
                    .message
                    .unwrap_or_else(|| "Quiz submission failed.".to_string()),
            ));
        }

        tracing::info!(
            "Learner {} scored {} ({}) on {:?}",
            payload.student_id,
            payload.total_score,
            payload.remarks,
            payload.target
        );

        self.error = None;
        self.phase = Phase::Submitted;
        self.report = Some(report.clone());
        Ok(report)
    }

    fn ensure_in_progress(&self) -> Result<(), AppError> {
        match self.phase {
            Phase::InProgress => Ok(()),
            Phase::Submitted => Err(AppError::Conflict(
                "This quiz has already been submitted".to_string(),
            )),
            Phase::Loading => Err(AppError::PrerequisiteMissing(
                "The quiz has not been loaded".to_string(),
            )),
        }
    }
}
