// src/session/autosave.rs

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::AppError;
use crate::models::{
    assessment::AssessmentKind,
    item::Item,
    payload::Identifier,
};
use crate::storage::DraftStore;
use crate::utils::debounce::Debouncer;

/// Scratch-storage keys of one editor.
///
/// Scoped by assessment so two editors never overwrite each other's drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftKeys {
    pub title: String,
    pub text: String,
    pub items: String,
}

impl DraftKeys {
    pub fn for_assessment(kind: &AssessmentKind, id: Option<&Identifier>) -> Self {
        let owner = match kind {
            AssessmentKind::Quiz { module_id } => format!("quiz:{}", module_id),
            AssessmentKind::ReadingTest => "test".to_string(),
        };
        let scope = match id {
            Some(id) => format!("{}:{}", owner, id),
            None => format!("{}:new", owner),
        };

        Self {
            title: format!("{}:title", scope),
            text: format!("{}:text", scope),
            items: format!("{}:items", scope),
        }
    }

    fn all(&self) -> [&str; 3] {
        [&self.title, &self.text, &self.items]
    }
}

/// "Saving" flag held for a fixed window after each scratch write.
#[derive(Debug, Clone, Default)]
pub struct SavingIndicator {
    raised_until: Arc<Mutex<Option<Instant>>>,
}

impl SavingIndicator {
    pub fn raise(&self, window: Duration) {
        let mut until = self
            .raised_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *until = Some(Instant::now() + window);
    }

    pub fn is_raised(&self) -> bool {
        let until = self
            .raised_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        until.is_some_and(|deadline| Instant::now() < deadline)
    }
}

/// Values found in scratch storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoredDraft {
    pub title: Option<String>,
    pub text: Option<String>,
    pub items: Option<Vec<Item>>,
}

impl RestoredDraft {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.is_none() && self.items.is_none()
    }
}

/// Debounced writes of editor state to a `DraftStore`.
///
/// Title, text and items each have their own timer. The saving indicator is
/// raised when a write fires and is not extended by edits.
pub struct Autosave {
    drafts: Arc<dyn DraftStore>,
    keys: DraftKeys,
    debouncer: Debouncer,
    debounce: Duration,
    indicator: SavingIndicator,
    indicator_window: Duration,
}

impl Autosave {
    pub fn new(
        drafts: Arc<dyn DraftStore>,
        keys: DraftKeys,
        debounce: Duration,
        indicator_window: Duration,
    ) -> Self {
        Self {
            drafts,
            keys,
            debouncer: Debouncer::new(),
            debounce,
            indicator: SavingIndicator::default(),
            indicator_window,
        }
    }

    pub fn keys(&self) -> &DraftKeys {
        &self.keys
    }

    pub fn title_changed(&mut self, title: &str) {
        let key = self.keys.title.clone();
        self.schedule(key, title.to_string());
    }

    pub fn text_changed(&mut self, text: &str) {
        let key = self.keys.text.clone();
        self.schedule(key, text.to_string());
    }

    pub fn items_changed(&mut self, items: &[Item]) {
        match serde_json::to_string(items) {
            Ok(json) => {
                let key = self.keys.items.clone();
                self.schedule(key, json);
            }
            Err(e) => tracing::error!("Failed to serialize draft items: {:?}", e),
        }
    }

    fn schedule(&mut self, key: String, value: String) {
        let drafts = self.drafts.clone();
        let indicator = self.indicator.clone();
        let window = self.indicator_window;
        let timer_key = key.clone();

        self.debouncer
            .schedule_after_quiescence(&timer_key, self.debounce, async move {
                indicator.raise(window);
                match drafts.put(&key, &value).await {
                    Ok(()) => tracing::debug!("Autosaved {}", key),
                    Err(e) => tracing::error!("Failed to autosave {}: {:?}", key, e),
                }
            });
    }

    pub fn is_saving(&self) -> bool {
        self.indicator.is_raised()
    }

    pub fn has_pending(&self) -> bool {
        self.keys.all().iter().any(|key| self.debouncer.is_pending(key))
    }

    /// Writes every pending edit now.
    pub async fn flush(&mut self) {
        self.debouncer.flush().await;
    }

    pub async fn restore(&self) -> Result<RestoredDraft, AppError> {
        let title = self.drafts.get(&self.keys.title).await?;
        let text = self.drafts.get(&self.keys.text).await?;
        let items = match self.drafts.get(&self.keys.items).await? {
            Some(json) => {
                let items: Vec<Item> = serde_json::from_str(&json)?;
                Some(items).filter(|items| !items.is_empty())
            }
            None => None,
        };

        Ok(RestoredDraft {
            title: title.filter(|t| !t.is_empty()),
            text: text.filter(|t| !t.is_empty()),
            items,
        })
    }

    /// Drops pending writes and deletes the stored draft.
    pub async fn clear(&mut self) -> Result<(), AppError> {
        self.debouncer.cancel_all();
        for key in self.keys.all() {
            self.drafts.remove(key).await?;
        }
        Ok(())
    }

    /// Moves to new keys. The draft under the old keys is deleted and
    /// pending writes are dropped; the caller reschedules what it wants kept.
    pub async fn rekey(&mut self, keys: DraftKeys) -> Result<(), AppError> {
        if keys == self.keys {
            return Ok(());
        }
        self.clear().await?;
        tracing::debug!("Draft keys moved from {} to {}", self.keys.title, keys.title);
        self.keys = keys;
        Ok(())
    }
}
