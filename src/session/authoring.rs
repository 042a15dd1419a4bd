// src/session/authoring.rs

use std::sync::Arc;

use crate::config::{Config, MIN_CHOICE_COUNT};
use crate::error::AppError;
use crate::models::{
    assessment::{Assessment, AssessmentKind, Status},
    item::{AnswerBody, Item, ItemErrors, QuestionType},
    payload::{AssessmentRef, Identifier, SavePayload},
};
use crate::services::store::AssessmentStore;
use crate::session::autosave::{Autosave, DraftKeys};
use crate::storage::DraftStore;
use crate::utils::html::is_blank_body;

const QUESTION_EMPTY: &str = "Question cannot be empty.";
const CHOICES_INCOMPLETE: &str = "All choices must be filled.";
const CHOICES_FILL_FIRST: &str = "Fill all choices before adding a new one.";
const ANSWER_UNSET: &str = "Please select an answer.";
const ANSWER_EMPTY: &str = "Answer cannot be empty.";
const ANSWER_INVALID_CHOICE: &str = "Please enter a valid choice before setting it as the answer.";
const FILL_REQUIRED: &str = "Please fill all the required fields.";
const UNEXPECTED: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Danger,
}

/// Session-level message for the host to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub tone: Tone,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            message: message.into(),
        }
    }

    fn danger(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Danger,
            message: message.into(),
        }
    }
}

/// Editable fields of one item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemField {
    Question(String),
    PlainText(bool),
    /// Switching to another type starts that type's answer data from blank.
    QuestionType(QuestionType),
    Choices(Vec<String>),
    AnswerIndex(Option<usize>),
    TrueFalseAnswer(Option<bool>),
    IdentificationAnswer(String),
}

/// Result of a full validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    TitleMissing,
    TextMissing,
    NoItems,
    /// The first item that failed; later items were not checked.
    ItemInvalid { index: usize },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn first_invalid_item(&self) -> Option<usize> {
        match self {
            ValidationOutcome::ItemInvalid { index } => Some(*index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved {
        id: Option<Identifier>,
        status: Status,
    },
    /// Blocked locally; nothing was sent.
    Rejected(ValidationOutcome),
}

/// In-memory editing state of one quiz or reading test.
pub struct AuthoringSession {
    assessment: Assessment,
    active_item: usize,
    title_error: Option<String>,
    text_error: Option<String>,
    notice: Option<Notice>,
    store: Arc<dyn AssessmentStore>,
    autosave: Autosave,
}

impl AuthoringSession {
    /// Starts an editor. With `existing`, call [`load`](Self::load) to pull its content.
    pub fn new(
        kind: AssessmentKind,
        existing: Option<Identifier>,
        store: Arc<dyn AssessmentStore>,
        drafts: Arc<dyn DraftStore>,
        config: &Config,
    ) -> Self {
        let keys = DraftKeys::for_assessment(&kind, existing.as_ref());
        let mut assessment = Assessment::new(kind);
        assessment.id = existing;

        Self {
            assessment,
            active_item: 0,
            title_error: None,
            text_error: None,
            notice: None,
            store,
            autosave: Autosave::new(drafts, keys, config.autosave_debounce, config.saving_indicator),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    pub fn items(&self) -> &[Item] {
        &self.assessment.items
    }

    pub fn item(&self, index: usize) -> Option<&Item> {
        self.assessment.items.get(index)
    }

    pub fn active_item(&self) -> usize {
        self.active_item
    }

    pub fn title_error(&self) -> Option<&str> {
        self.title_error.as_deref()
    }

    pub fn text_error(&self) -> Option<&str> {
        self.text_error.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// True for a short window after an autosave write.
    pub fn is_saving(&self) -> bool {
        self.autosave.is_saving()
    }

    /// Edits waiting for their autosave timer.
    pub fn has_pending_drafts(&self) -> bool {
        self.autosave.has_pending()
    }

    pub fn draft_keys(&self) -> &DraftKeys {
        self.autosave.keys()
    }

    pub fn set_active_item(&mut self, index: usize) -> Result<(), AppError> {
        self.check_index(index)?;
        self.active_item = index;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Loading and drafts
    // -----------------------------------------------------------------------

    /// Replaces the content with the stored version of this assessment.
    pub async fn load(&mut self) -> Result<(), AppError> {
        let id = self.assessment.id.clone().ok_or_else(|| {
            AppError::PrerequisiteMissing("Nothing to load: the assessment is unsaved".to_string())
        })?;
        let kind = self.assessment.kind.clone();
        let target = AssessmentRef::for_kind(&kind, id.clone());

        let loaded = match self.store.fetch_assessment(&target).await {
            Ok(dto) => dto.into_assessment(id, kind),
            Err(e) => {
                tracing::error!("An error occurred fetching {:?}: {:?}", target, e);
                Err(e)
            }
        };

        match loaded {
            Ok(mut assessment) => {
                if assessment.items.is_empty() {
                    assessment.items.push(Item::default());
                }
                tracing::info!(
                    "Loaded {:?} with {} items",
                    target,
                    assessment.items.len()
                );
                self.assessment = assessment;
                self.active_item = 0;
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    AppError::Persistence(msg) => msg.clone(),
                    _ => format!("Failed to load {} data.", self.assessment.kind.noun()),
                };
                self.notice = Some(Notice::danger(message));
                Err(e)
            }
        }
    }

    /// Applies whatever the autosave left in scratch storage. Returns whether anything was restored.
    pub async fn restore_draft(&mut self) -> Result<bool, AppError> {
        let draft = self.autosave.restore().await.map_err(|e| {
            tracing::error!("Failed to read draft: {:?}", e);
            e
        })?;

        if draft.is_empty() {
            return Ok(false);
        }
        if let Some(title) = draft.title {
            self.assessment.title = title;
        }
        if let Some(text) = draft.text {
            self.assessment.description_or_text = text;
        }
        if let Some(items) = draft.items {
            self.assessment.items = items;
            self.active_item = self.active_item.min(self.assessment.items.len() - 1);
        }
        Ok(true)
    }

    /// Writes pending autosaves now.
    pub async fn flush_drafts(&mut self) {
        self.autosave.flush().await;
    }

    /// Ends the session after pending autosaves have been written.
    pub async fn close(mut self) {
        self.autosave.flush().await;
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    pub fn set_title(&mut self, title: &str) {
        self.assessment.title = title.to_string();
        self.autosave.title_changed(title);
    }

    /// Quiz description or reading-test passage.
    pub fn set_description_or_text(&mut self, text: &str) {
        self.assessment.description_or_text = text.to_string();
        self.autosave.text_changed(text);
    }

    /// Appends a blank multiple-choice item and focuses it.
    pub fn add_item(&mut self) -> usize {
        self.assessment.items.push(Item::default());
        self.active_item = self.assessment.items.len() - 1;
        self.items_changed();
        self.active_item
    }

    /// Removes an item. The last remaining item is never removed.
    pub fn remove_item(&mut self, index: usize) -> Result<bool, AppError> {
        self.check_index(index)?;
        if self.assessment.items.len() <= 1 {
            tracing::debug!("Refusing to remove the only item");
            return Ok(false);
        }

        self.assessment.items.remove(index);
        self.active_item = self.active_item.min(self.assessment.items.len() - 1);
        self.items_changed();
        Ok(true)
    }

    pub fn set_item_field(&mut self, index: usize, field: ItemField) -> Result<(), AppError> {
        self.check_index(index)?;
        let item = &mut self.assessment.items[index];

        match field {
            ItemField::Question(question) => item.question = question,
            ItemField::PlainText(is_plain) => item.is_plain_text = is_plain,
            ItemField::QuestionType(question_type) => {
                if item.question_type() != question_type {
                    item.body = AnswerBody::blank(question_type);
                }
                item.errors.clear();
            }
            ItemField::Choices(new_choices) => {
                if new_choices.len() < MIN_CHOICE_COUNT {
                    return Err(AppError::Validation(format!(
                        "A multiple choice item needs at least {} choices",
                        MIN_CHOICE_COUNT
                    )));
                }
                let AnswerBody::MultipleChoice {
                    choices,
                    answer_index,
                } = &mut item.body
                else {
                    return Err(not_multiple_choice(index));
                };
                if answer_index.is_some_and(|i| i >= new_choices.len()) {
                    *answer_index = None;
                }
                *choices = new_choices;
            }
            ItemField::AnswerIndex(new_index) => {
                let AnswerBody::MultipleChoice {
                    choices,
                    answer_index,
                } = &mut item.body
                else {
                    return Err(not_multiple_choice(index));
                };
                if let Some(i) = new_index {
                    if i >= choices.len() {
                        return Err(AppError::NotFound(format!(
                            "Item {} has no choice {}",
                            index, i
                        )));
                    }
                }
                *answer_index = new_index;
            }
            ItemField::TrueFalseAnswer(value) => {
                let AnswerBody::TrueFalse { answer } = &mut item.body else {
                    return Err(wrong_type(index, QuestionType::TrueFalse));
                };
                *answer = value;
            }
            ItemField::IdentificationAnswer(value) => {
                let AnswerBody::Identification { answer } = &mut item.body else {
                    return Err(wrong_type(index, QuestionType::Identification));
                };
                *answer = value;
            }
        }

        self.items_changed();
        Ok(())
    }

    /// Edits the text of one choice.
    pub fn set_choice(&mut self, index: usize, choice_index: usize, value: &str) -> Result<(), AppError> {
        let mut choices = self.choices_of(index)?.to_vec();
        let slot = choices.get_mut(choice_index).ok_or_else(|| {
            AppError::NotFound(format!("Item {} has no choice {}", index, choice_index))
        })?;
        *slot = value.to_string();
        self.set_item_field(index, ItemField::Choices(choices))
    }

    /// Flips between the plain-text and rich-text editor.
    pub fn toggle_editor(&mut self, index: usize) -> Result<(), AppError> {
        self.check_index(index)?;
        let is_plain = self.assessment.items[index].is_plain_text;
        self.set_item_field(index, ItemField::PlainText(!is_plain))
    }

    /// Appends an empty choice unless one is already empty.
    pub fn add_choice(&mut self, index: usize) -> Result<bool, AppError> {
        let mut choices = self.choices_of(index)?.to_vec();

        if choices.iter().any(String::is_empty) {
            self.assessment.items[index].errors.choices_error = Some(CHOICES_FILL_FIRST.to_string());
            return Ok(false);
        }

        choices.push(String::new());
        self.set_item_field(index, ItemField::Choices(choices))?;
        self.assessment.items[index].errors.choices_error = None;
        Ok(true)
    }

    /// Removes a choice and keeps the selected answer pointing at the same text.
    /// Refused once only the minimum number of choices remain.
    pub fn remove_choice(&mut self, index: usize, choice_index: usize) -> Result<bool, AppError> {
        let choices = self.choices_of(index)?;
        if choice_index >= choices.len() {
            return Err(AppError::NotFound(format!(
                "Item {} has no choice {}",
                index, choice_index
            )));
        }
        if choices.len() <= MIN_CHOICE_COUNT {
            return Ok(false);
        }

        if let AnswerBody::MultipleChoice {
            choices,
            answer_index,
        } = &mut self.assessment.items[index].body
        {
            choices.remove(choice_index);
            *answer_index = reindex_after_removal(*answer_index, choice_index);
        }

        self.items_changed();
        Ok(true)
    }

    /// Marks a choice as the correct answer. Empty choices cannot be selected.
    pub fn set_answer(&mut self, index: usize, choice_index: usize) -> Result<bool, AppError> {
        let choices = self.choices_of(index)?;
        let choice = choices.get(choice_index).ok_or_else(|| {
            AppError::NotFound(format!("Item {} has no choice {}", index, choice_index))
        })?;

        if choice.is_empty() {
            self.assessment.items[index].errors.answer_error =
                Some(ANSWER_INVALID_CHOICE.to_string());
            return Ok(false);
        }

        self.set_item_field(index, ItemField::AnswerIndex(Some(choice_index)))?;
        self.assessment.items[index].errors.answer_error = None;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Validation and saving
    // -----------------------------------------------------------------------

    /// Checks the whole assessment, stopping at the first failing item.
    ///
    /// Failures are written to the title/text error or to that item's error
    /// slots; items before it have their slots cleared.
    pub fn validate(&mut self) -> ValidationOutcome {
        if !self.check_title() {
            return ValidationOutcome::TitleMissing;
        }

        if self.assessment.kind.requires_text() && self.assessment.description_or_text.trim().is_empty() {
            self.text_error = Some(format!("{} text cannot be empty.", self.capitalized_noun()));
            return ValidationOutcome::TextMissing;
        }
        self.text_error = None;

        if self.assessment.items.is_empty() {
            tracing::error!("{} must have at least one item.", self.capitalized_noun());
            return ValidationOutcome::NoItems;
        }

        for (index, item) in self.assessment.items.iter_mut().enumerate() {
            if !validate_item(item) {
                return ValidationOutcome::ItemInvalid { index };
            }
        }

        ValidationOutcome::Valid
    }

    /// Saves without publishing. Only the title is required.
    pub async fn save_as_draft(&mut self) -> Result<SaveOutcome, AppError> {
        if !self.check_title() {
            return Ok(SaveOutcome::Rejected(ValidationOutcome::TitleMissing));
        }
        self.save(Status::Draft).await
    }

    /// Publishes after a full validation pass. Focuses the first failing item otherwise.
    pub async fn publish(&mut self) -> Result<SaveOutcome, AppError> {
        let outcome = self.validate();
        if !outcome.is_valid() {
            if let Some(index) = outcome.first_invalid_item() {
                self.active_item = index;
            }
            self.notice = Some(Notice::danger(FILL_REQUIRED));
            return Ok(SaveOutcome::Rejected(outcome));
        }
        self.save(Status::Published).await
    }

    async fn save(&mut self, status: Status) -> Result<SaveOutcome, AppError> {
        let publish = status == Status::Published;
        let payload = SavePayload::build(&self.assessment, publish.then_some(Status::Published));
        if let Err(e) = payload.check() {
            self.notice = Some(Notice::danger(e.message().to_string()));
            return Err(e);
        }

        let noun = self.assessment.kind.noun();
        let response = match self.store.save_assessment(&payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Error occurred saving {}: {:?}", noun, e);
                self.notice = Some(Notice::danger(UNEXPECTED));
                return Err(AppError::Persistence(e.message().to_string()));
            }
        };

        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| format!("An error occurred while saving the {}.", noun));
            tracing::error!("Store rejected {} save: {}", noun, message);
            self.notice = Some(Notice::danger(message.clone()));
            return Err(AppError::Persistence(message));
        }

        self.assessment.merge_item_ids(&response.items);
        let first_id = self.assessment.id.is_none() && response.id.is_some();
        if response.id.is_some() {
            self.assessment.id = response.id;
        }
        self.assessment.status = Some(status);

        // A "new" draft now belongs to this id; the next new editor must not pick it up.
        if first_id {
            let keys = DraftKeys::for_assessment(&self.assessment.kind, self.assessment.id.as_ref());
            if let Err(e) = self.autosave.rekey(keys).await {
                tracing::error!("Failed to move draft to saved {}: {:?}", noun, e);
            }
        }

        let message = if publish {
            format!("The {} has been published.", noun)
        } else {
            format!("The {} has been saved as a draft.", noun)
        };
        tracing::info!("{} (id {:?})", message, self.assessment.id);
        self.notice = Some(Notice::success(message));

        if publish {
            if let Err(e) = self.autosave.clear().await {
                tracing::error!("Failed to clear draft after publishing: {:?}", e);
            }
        } else {
            // Item ids are part of the draft now.
            self.autosave.title_changed(&self.assessment.title);
            self.autosave.text_changed(&self.assessment.description_or_text);
            self.items_changed();
        }

        Ok(SaveOutcome::Saved {
            id: self.assessment.id.clone(),
            status,
        })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn check_title(&mut self) -> bool {
        if self.assessment.title.trim().is_empty() {
            self.title_error = Some(format!("{} title cannot be empty.", self.capitalized_noun()));
            false
        } else {
            self.title_error = None;
            true
        }
    }

    fn capitalized_noun(&self) -> &'static str {
        match self.assessment.kind {
            AssessmentKind::Quiz { .. } => "Quiz",
            AssessmentKind::ReadingTest => "Test",
        }
    }

    fn check_index(&self, index: usize) -> Result<(), AppError> {
        if index < self.assessment.items.len() {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Item {} does not exist", index)))
        }
    }

    fn choices_of(&self, index: usize) -> Result<&[String], AppError> {
        self.check_index(index)?;
        match &self.assessment.items[index].body {
            AnswerBody::MultipleChoice { choices, .. } => Ok(choices),
            _ => Err(not_multiple_choice(index)),
        }
    }

    fn items_changed(&mut self) {
        self.autosave.items_changed(&self.assessment.items);
    }
}

/// New answer index after removing `removed` from the choice list.
pub fn reindex_after_removal(answer_index: Option<usize>, removed: usize) -> Option<usize> {
    match answer_index {
        Some(current) if current == removed => None,
        Some(current) if removed < current => Some(current - 1),
        other => other,
    }
}

/// Applies the per-item rules in order, first failure wins.
fn validate_item(item: &mut Item) -> bool {
    let errors: &mut ItemErrors = &mut item.errors;

    if is_blank_body(&item.question, item.is_plain_text) {
        errors.question_error = Some(QUESTION_EMPTY.to_string());
        return false;
    }
    errors.question_error = None;

    match &item.body {
        AnswerBody::MultipleChoice {
            choices,
            answer_index,
        } => {
            if choices.iter().any(|choice| choice.trim().is_empty()) {
                errors.choices_error = Some(CHOICES_INCOMPLETE.to_string());
                return false;
            }
            if answer_index.is_none() {
                errors.answer_error = Some(ANSWER_UNSET.to_string());
                return false;
            }
            errors.choices_error = None;
            errors.answer_error = None;
        }
        AnswerBody::TrueFalse { answer } => {
            if answer.is_none() {
                errors.answer_error = Some(ANSWER_UNSET.to_string());
                return false;
            }
            errors.answer_error = None;
        }
        AnswerBody::Identification { answer } => {
            if answer.trim().is_empty() {
                errors.answer_error = Some(ANSWER_EMPTY.to_string());
                return false;
            }
            errors.answer_error = None;
        }
    }

    true
}

fn not_multiple_choice(index: usize) -> AppError {
    wrong_type(index, QuestionType::MultipleChoice)
}

fn wrong_type(index: usize, expected: QuestionType) -> AppError {
    AppError::Validation(format!("Item {} is not a {} question", index, expected.as_str()))
}
