use crate::domain::{
    DomainResult, GetReadingsInput, HeartRateRepository, Reading, UpsertReadingsInput,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory implementation of HeartRateRepository using HashMap
#[derive(Clone)]
pub struct InMemoryHeartRateRepository {
    readings: Arc<RwLock<HashMap<String, Vec<Reading>>>>,
}

impl InMemoryHeartRateRepository {
    pub fn new() -> Self {
        Self {
            readings: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of users with stored readings
    pub async fn user_count(&self) -> usize {
        self.readings.read().await.len()
    }
}

impl Default for InMemoryHeartRateRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HeartRateRepository for InMemoryHeartRateRepository {
    async fn upsert_readings(&self, input: UpsertReadingsInput) -> DomainResult<()> {
        debug!(
            user_id = %input.user_id,
            reading_count = input.readings.len(),
            "replacing readings in memory"
        );
        let mut readings = self.readings.write().await;
        readings.insert(input.user_id, input.readings);
        Ok(())
    }

    async fn get_readings(&self, input: GetReadingsInput) -> DomainResult<Option<Vec<Reading>>> {
        let readings = self.readings.read().await;
        Ok(readings.get(&input.user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn reading(minute: u32, value: i32) -> Reading {
        Reading::new(Utc.with_ymd_and_hms(2024, 1, 1, 8, minute, 0).unwrap(), value)
    }

    #[tokio::test]
    async fn test_upsert_creates_then_replaces() {
        let repo = InMemoryHeartRateRepository::new();

        repo.upsert_readings(UpsertReadingsInput {
            user_id: "u1".to_string(),
            readings: vec![reading(0, 60), reading(5, 70)],
        })
        .await
        .unwrap();

        repo.upsert_readings(UpsertReadingsInput {
            user_id: "u1".to_string(),
            readings: vec![reading(10, 80)],
        })
        .await
        .unwrap();

        let stored = repo
            .get_readings(GetReadingsInput {
                user_id: "u1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(stored, Some(vec![reading(10, 80)]));
        assert_eq!(repo.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_user() {
        let repo = InMemoryHeartRateRepository::new();

        let stored = repo
            .get_readings(GetReadingsInput {
                user_id: "nobody".to_string(),
            })
            .await
            .unwrap();

        assert!(stored.is_none());
    }
}
