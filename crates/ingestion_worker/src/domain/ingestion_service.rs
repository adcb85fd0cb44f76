use crate::domain::{Downsampler, IngestionConfig, StreamIngestor, UploadGuard};
use common::domain::{
    DomainError, DomainResult, HeartRateRepository, IngestionReport, UpsertReadingsInput,
    UserSummary,
};
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Domain service that drives one upload through the pipeline
///
/// Flow:
/// 1. Read the CSV stream once, validating and grouping rows per user
/// 2. Downsample each user's readings into fixed-width buckets
/// 3. Replace the user's stored readings with the reduced series
/// 4. Summarize per-user reduction plus the rejected rows
///
/// Users are written one after another and a persistence failure aborts the run.
/// Users written before the failure stay written.
pub struct IngestionService {
    repository: Arc<dyn HeartRateRepository>,
    ingestor: StreamIngestor,
    downsampler: Downsampler,
    invalid_sample_limit: usize,
}

impl IngestionService {
    pub fn new(repository: Arc<dyn HeartRateRepository>, config: &IngestionConfig) -> Self {
        Self {
            repository,
            ingestor: StreamIngestor::from_config(config),
            downsampler: Downsampler::from_config(config),
            invalid_sample_limit: config.invalid_sample_limit,
        }
    }

    /// Process an uploaded file. The file is deleted when this returns, whatever the outcome.
    #[instrument(skip_all, fields(path = %upload.path().display()))]
    pub async fn process_upload(&self, upload: UploadGuard) -> DomainResult<IngestionReport> {
        let file = upload.open()?;
        self.run(file).await
    }

    /// Ingest, reduce, persist and summarize one CSV byte stream
    pub async fn run<R>(&self, reader: R) -> DomainResult<IngestionReport>
    where
        R: Read + Send + 'static,
    {
        let ingestor = self.ingestor.clone();
        let ingested = tokio::task::spawn_blocking(move || ingestor.ingest(reader))
            .await
            .map_err(|e| DomainError::StreamReadError(format!("ingestion task failed: {}", e)))??;

        let mut users: Vec<_> = ingested.readings_by_user.into_iter().collect();
        users.sort_by(|a, b| a.0.cmp(&b.0));

        let mut summary = Vec::with_capacity(users.len());
        for (user_id, readings) in users {
            let reduced = self.downsampler.reduce(&readings);
            if reduced.is_empty() {
                debug!(user_id = %user_id, "no readings left after reduction, skipping");
                continue;
            }

            let user_summary = UserSummary::new(user_id.clone(), readings.len(), reduced.len());
            self.repository
                .upsert_readings(UpsertReadingsInput {
                    user_id: user_id.clone(),
                    readings: reduced,
                })
                .await?;

            debug!(
                user_id = %user_id,
                original_count = user_summary.original_readings,
                reduced_count = user_summary.reduced_readings,
                "stored reduced readings"
            );
            summary.push(user_summary);
        }

        info!(
            users = summary.len(),
            invalid_count = ingested.invalid.len(),
            "upload processed"
        );

        Ok(IngestionReport::new(
            summary,
            ingested.invalid,
            self.invalid_sample_limit,
        ))
    }
}
