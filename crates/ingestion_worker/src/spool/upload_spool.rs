use crate::domain::{IngestionService, UploadGuard};
use anyhow::{Context, Result};
use common::domain::ErrorReport;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct UploadSpoolConfig {
    /// Directory uploads are dropped into; each file is deleted once processed
    pub upload_dir: PathBuf,
    /// Where JSON reports are written, one per upload. Reports are only logged when unset.
    pub report_dir: Option<PathBuf>,
    pub poll_interval: Duration,
}

/// Feeds files from the upload directory through the ingestion pipeline.
///
/// Files whose names start with `.` are treated as still being written and left
/// alone. Uploads are processed in file-name order, one at a time.
pub struct UploadSpool {
    service: Arc<IngestionService>,
    config: UploadSpoolConfig,
}

impl UploadSpool {
    pub fn new(service: Arc<IngestionService>, config: UploadSpoolConfig) -> Self {
        Self { service, config }
    }

    pub async fn run(self, ctx: CancellationToken) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.upload_dir)
            .await
            .with_context(|| format!("creating {}", self.config.upload_dir.display()))?;
        if let Some(report_dir) = &self.config.report_dir {
            tokio::fs::create_dir_all(report_dir)
                .await
                .with_context(|| format!("creating {}", report_dir.display()))?;
        }

        info!(
            upload_dir = %self.config.upload_dir.display(),
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "upload spool started"
        );

        loop {
            if let Err(e) = self.drain(&ctx).await {
                error!("failed to scan upload directory: {:#}", e);
            }

            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("upload spool stopping");
                    break;
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        Ok(())
    }

    /// Process every pending upload once. Returns how many were picked up.
    pub async fn drain(&self, ctx: &CancellationToken) -> Result<usize> {
        let pending = self.pending_uploads().await?;
        let mut processed = 0;

        for path in pending {
            if ctx.is_cancelled() {
                break;
            }
            self.process(path).await;
            processed += 1;
        }

        Ok(processed)
    }

    async fn pending_uploads(&self) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.config.upload_dir).await?;
        let mut pending = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            pending.push(entry.path());
        }

        pending.sort();
        Ok(pending)
    }

    async fn process(&self, path: PathBuf) {
        let name = upload_name(&path);
        debug!(upload = %name, "processing upload");

        match self.service.process_upload(UploadGuard::new(&path)).await {
            Ok(report) => {
                info!(
                    upload = %name,
                    users = report.summary.len(),
                    invalid_count = report.invalid_readings.as_ref().map_or(0, |r| r.count),
                    "upload ingested"
                );
                self.emit_report(&name, &report).await;
            }
            Err(e) => {
                error!(upload = %name, error = %e, "failed to process upload");
                self.emit_report(&name, &ErrorReport::new(e.to_string())).await;
            }
        }
    }

    async fn emit_report<T: Serialize>(&self, name: &str, report: &T) {
        let body = match serde_json::to_string_pretty(report) {
            Ok(body) => body,
            Err(e) => {
                warn!(upload = %name, error = %e, "failed to serialize report");
                return;
            }
        };

        let Some(report_dir) = &self.config.report_dir else {
            info!(upload = %name, report = %body, "ingestion report");
            return;
        };

        let report_path = report_dir.join(format!("{}.json", name));
        if let Err(e) = tokio::fs::write(&report_path, body).await {
            warn!(path = %report_path.display(), error = %e, "failed to write report");
        }
    }
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IngestionConfig;
    use common::domain::{DomainError, MockHeartRateRepository};

    fn spool(repo: MockHeartRateRepository, upload_dir: &Path, report_dir: &Path) -> UploadSpool {
        let service = Arc::new(IngestionService::new(
            Arc::new(repo),
            &IngestionConfig::default(),
        ));
        UploadSpool::new(
            service,
            UploadSpoolConfig {
                upload_dir: upload_dir.to_path_buf(),
                report_dir: Some(report_dir.to_path_buf()),
                poll_interval: Duration::from_millis(10),
            },
        )
    }

    #[tokio::test]
    async fn test_drain_processes_files_and_writes_reports() {
        let uploads = tempfile::tempdir().unwrap();
        let reports = tempfile::tempdir().unwrap();
        std::fs::write(
            uploads.path().join("1-a.csv"),
            "u1,2024-01-01T08:00:00Z,72\n",
        )
        .unwrap();
        std::fs::write(uploads.path().join(".partial.csv"), "u2,bad,1\n").unwrap();

        let mut repo = MockHeartRateRepository::new();
        repo.expect_upsert_readings().times(1).returning(|_| Ok(()));

        let processed = spool(repo, uploads.path(), reports.path())
            .drain(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(processed, 1);
        assert!(!uploads.path().join("1-a.csv").exists());
        assert!(uploads.path().join(".partial.csv").exists());

        let report: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(reports.path().join("1-a.csv.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(report["message"], "Data processed");
        assert_eq!(report["summary"][0]["userId"], "u1");
        assert!(report.get("invalidReadings").is_none());
    }

    #[tokio::test]
    async fn test_failed_upload_writes_error_report_and_is_removed() {
        let uploads = tempfile::tempdir().unwrap();
        let reports = tempfile::tempdir().unwrap();
        std::fs::write(
            uploads.path().join("2-b.csv"),
            "u1,2024-01-01T08:00:00Z,72\n",
        )
        .unwrap();

        let mut repo = MockHeartRateRepository::new();
        repo.expect_upsert_readings()
            .returning(|_| Err(DomainError::PersistenceError(anyhow::anyhow!("db down"))));

        spool(repo, uploads.path(), reports.path())
            .drain(&CancellationToken::new())
            .await
            .unwrap();

        assert!(!uploads.path().join("2-b.csv").exists());
        let report: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(reports.path().join("2-b.csv.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(report["error"], "Failed to process file");
        assert!(report["details"].as_str().unwrap().contains("db down"));
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let uploads = tempfile::tempdir().unwrap();
        let reports = tempfile::tempdir().unwrap();
        let spool = spool(
            MockHeartRateRepository::new(),
            &uploads.path().join("incoming"),
            &reports.path().join("out"),
        );

        let ctx = CancellationToken::new();
        ctx.cancel();

        spool.run(ctx).await.unwrap();

        assert!(uploads.path().join("incoming").is_dir());
        assert!(reports.path().join("out").is_dir());
    }
}
