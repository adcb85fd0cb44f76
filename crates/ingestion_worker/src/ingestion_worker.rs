use crate::domain::{IngestionConfig, IngestionService};
use crate::spool::{UploadSpool, UploadSpoolConfig};
use common::domain::{DomainResult, HeartRateRepository};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct IngestionWorkerConfig {
    pub upload_dir: PathBuf,
    pub report_dir: Option<PathBuf>,
    pub poll_interval_secs: u64,
    pub ingestion: IngestionConfig,
}

pub struct IngestionWorker {
    spool: UploadSpool,
}

impl IngestionWorker {
    pub fn new(
        repository: Arc<dyn HeartRateRepository>,
        config: IngestionWorkerConfig,
    ) -> DomainResult<Self> {
        info!("Initializing heart-rate ingestion worker");

        config.ingestion.ensure_valid()?;
        let service = Arc::new(IngestionService::new(repository, &config.ingestion));

        let spool = UploadSpool::new(
            service,
            UploadSpoolConfig {
                upload_dir: config.upload_dir,
                report_dir: config.report_dir,
                poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            },
        );

        info!(
            bucket_minutes = config.ingestion.bucket_minutes,
            min_bpm = config.ingestion.min_bpm,
            max_bpm = config.ingestion.max_bpm,
            "Heart-rate ingestion worker initialized"
        );

        Ok(Self { spool })
    }

    /// Run until the token is cancelled
    pub async fn run(self, ctx: CancellationToken) -> anyhow::Result<()> {
        self.spool.run(ctx).await
    }
}
