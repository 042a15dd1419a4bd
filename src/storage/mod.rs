// src/storage/mod.rs

use async_trait::async_trait;

use crate::error::AppError;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryDraftStore;
pub use sqlite::SqliteDraftStore;

/// Local scratch storage for editor autosave. Plain key/value strings.
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn put(&self, key: &str, value: &str) -> Result<(), AppError>;

    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn remove(&self, key: &str) -> Result<(), AppError>;
}
