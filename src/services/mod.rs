// src/services/mod.rs

pub mod catalog;
pub mod identity;
pub mod store;

pub use catalog::Catalog;
pub use identity::{IdentityProvider, LearnerDirectory, StaticIdentity};
pub use store::AssessmentStore;
