use crate::domain::{DomainResult, Reading};
use async_trait::async_trait;

/// Input for replacing a user's stored readings
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertReadingsInput {
    pub user_id: String,
    pub readings: Vec<Reading>,
}

/// Input for reading back a user's stored readings
#[derive(Debug, Clone, PartialEq)]
pub struct GetReadingsInput {
    pub user_id: String,
}

/// Repository trait for heart-rate document storage
/// Infrastructure layer (Postgres, in-memory) implements this trait
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait HeartRateRepository: Send + Sync {
    /// Replace the user's readings entirely, creating the user's record if absent.
    /// Concurrent writes for the same user are last-writer-wins.
    async fn upsert_readings(&self, input: UpsertReadingsInput) -> DomainResult<()>;

    /// Get the stored readings for a user, if any were ever written
    async fn get_readings(&self, input: GetReadingsInput) -> DomainResult<Option<Vec<Reading>>>;
}
