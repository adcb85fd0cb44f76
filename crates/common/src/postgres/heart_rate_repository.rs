use crate::domain::{
    DomainError, DomainResult, GetReadingsInput, HeartRateRepository, Reading, UpsertReadingsInput,
};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error};

/// Encode readings as the JSONB document stored in `heart_rates.readings`
pub fn readings_to_json(readings: &[Reading]) -> DomainResult<serde_json::Value> {
    serde_json::to_value(readings).map_err(|e| DomainError::PersistenceError(e.into()))
}

/// Decode the JSONB readings document
pub fn json_to_readings(json: serde_json::Value) -> DomainResult<Vec<Reading>> {
    serde_json::from_value(json).map_err(|e| DomainError::PersistenceError(e.into()))
}

/// PostgreSQL implementation of HeartRateRepository
#[derive(Clone)]
pub struct PostgresHeartRateRepository {
    client: PostgresClient,
}

impl PostgresHeartRateRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HeartRateRepository for PostgresHeartRateRepository {
    async fn upsert_readings(&self, input: UpsertReadingsInput) -> DomainResult<()> {
        debug!(
            user_id = %input.user_id,
            reading_count = input.readings.len(),
            "replacing readings in database"
        );

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::PersistenceError)?;

        let readings = readings_to_json(&input.readings)?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO heart_rates (user_id, readings, created_at, updated_at)
             VALUES ($1, $2, $3, $3)
             ON CONFLICT (user_id)
             DO UPDATE SET readings = EXCLUDED.readings, updated_at = EXCLUDED.updated_at",
            &[&input.user_id, &readings, &now],
        )
        .await
        .map_err(|e| {
            error!(user_id = %input.user_id, "failed to upsert readings: {}", e);
            DomainError::PersistenceError(e.into())
        })?;

        Ok(())
    }

    async fn get_readings(&self, input: GetReadingsInput) -> DomainResult<Option<Vec<Reading>>> {
        debug!(user_id = %input.user_id, "getting readings from database");

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::PersistenceError)?;

        let row = conn
            .query_opt(
                "SELECT readings FROM heart_rates WHERE user_id = $1",
                &[&input.user_id],
            )
            .await
            .map_err(|e| DomainError::PersistenceError(e.into()))?;

        row.map(|row| json_to_readings(row.get(0))).transpose()
    }
}
