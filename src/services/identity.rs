// src/services/identity.rs

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::payload::LearnerIdResponse;

/// The authenticated account, if any.
pub trait IdentityProvider: Send + Sync {
    fn current_account(&self) -> Option<String>;
}

/// Resolves an account to the learner's student id number.
#[async_trait]
pub trait LearnerDirectory: Send + Sync {
    /// `GET students/getIDNumber/{uid}`.
    async fn lookup_learner_id(&self, account_uid: &str) -> Result<LearnerIdResponse, AppError>;
}

/// Fixed identity, for hosts that resolve auth up front.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<String>);

impl StaticIdentity {
    pub fn signed_in(account_uid: &str) -> Self {
        Self(Some(account_uid.to_string()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_account(&self) -> Option<String> {
        self.0.clone()
    }
}
