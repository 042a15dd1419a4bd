use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{assessment::AssessmentKind, payload::Identifier};
use crate::services::{AssessmentStore, Catalog, IdentityProvider, LearnerDirectory};
use crate::session::{AuthoringSession, GradingSession};
use crate::storage::{DraftStore, SqliteDraftStore};

/// Collaborators shared by every session the host opens.
#[derive(Clone)]
pub struct EngineContext {
    pub config: Config,
    pub store: Arc<dyn AssessmentStore>,
    pub drafts: Arc<dyn DraftStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub learners: Arc<dyn LearnerDirectory>,
}

impl EngineContext {
    pub fn new(
        config: Config,
        store: Arc<dyn AssessmentStore>,
        drafts: Arc<dyn DraftStore>,
        identity: Arc<dyn IdentityProvider>,
        learners: Arc<dyn LearnerDirectory>,
    ) -> Self {
        Self {
            config,
            store,
            drafts,
            identity,
            learners,
        }
    }

    /// Like [`new`](Self::new), with drafts kept in `config.draft_database_url`.
    pub async fn with_sqlite_drafts(
        config: Config,
        store: Arc<dyn AssessmentStore>,
        identity: Arc<dyn IdentityProvider>,
        learners: Arc<dyn LearnerDirectory>,
    ) -> Result<Self, AppError> {
        let drafts = SqliteDraftStore::connect(&config.draft_database_url).await?;
        tracing::info!("Draft store ready at {}", config.draft_database_url);
        Ok(Self::new(config, store, Arc::new(drafts), identity, learners))
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.store.clone())
    }

    /// Editor for a brand-new assessment.
    pub fn author(&self, kind: AssessmentKind) -> AuthoringSession {
        AuthoringSession::new(kind, None, self.store.clone(), self.drafts.clone(), &self.config)
    }

    /// Editor for an existing assessment, loaded from the store.
    pub async fn edit(&self, kind: AssessmentKind, id: Identifier) -> Result<AuthoringSession, AppError> {
        let mut session = AuthoringSession::new(
            kind,
            Some(id),
            self.store.clone(),
            self.drafts.clone(),
            &self.config,
        );
        session.load().await?;
        Ok(session)
    }

    /// Grading session for the signed-in learner, ready to answer.
    pub async fn take(&self, kind: AssessmentKind, id: Identifier) -> Result<GradingSession, AppError> {
        let mut session = GradingSession::new(
            self.store.clone(),
            self.identity.clone(),
            self.learners.clone(),
            &self.config,
        );
        session.start(kind, id).await?;
        Ok(session)
    }
}
