use chrono::{Duration, TimeZone, Utc};
use common::domain::{
    GetReadingsInput, HeartRateRepository, InMemoryHeartRateRepository, Reading, RecordRejection,
};
use ingestion_worker::domain::{IngestionConfig, IngestionService, UploadGuard};
use std::sync::Arc;

const UPLOAD: &str = "\
u1,2024-01-01T08:00:00Z,60
u1,2024-01-01T08:02:00Z,64
u1,2024-01-01T08:06:00Z,70
u2,2024-01-01 09:00:00,80
u2,2024-01-01 09:00:30,81
u3,not-a-date,72
,2024-01-01T08:00:00Z,72
u4,2024-01-01T08:00:00Z,300
u4,2024-01-01T08:00:00Z
";

async fn stored(repo: &InMemoryHeartRateRepository, user_id: &str) -> Option<Vec<Reading>> {
    repo.get_readings(GetReadingsInput {
        user_id: user_id.to_string(),
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_upload_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("1704096000000-heart.csv");
    std::fs::write(&path, UPLOAD).unwrap();

    let repo = Arc::new(InMemoryHeartRateRepository::new());
    let service = IngestionService::new(repo.clone(), &IngestionConfig::default());

    let report = service
        .process_upload(UploadGuard::new(&path))
        .await
        .unwrap();

    assert!(!path.exists(), "upload must be removed after processing");

    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    assert_eq!(
        stored(&repo, "u1").await,
        Some(vec![
            Reading::new(t0, 62),
            Reading::new(t0 + Duration::minutes(5), 70)
        ])
    );
    assert_eq!(
        stored(&repo, "u2").await,
        Some(vec![Reading::new(t0 + Duration::hours(1), 81)])
    );
    assert_eq!(stored(&repo, "u3").await, None);
    assert_eq!(stored(&repo, "u4").await, None);
    assert_eq!(repo.user_count().await, 2);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["message"], "Data processed");
    assert_eq!(
        json["summary"],
        serde_json::json!([
            { "userId": "u1", "originalReadings": 3, "reducedReadings": 2, "reductionPercentage": 33 },
            { "userId": "u2", "originalReadings": 2, "reducedReadings": 1, "reductionPercentage": 50 }
        ])
    );

    let invalid = report.invalid_readings.unwrap();
    assert_eq!(invalid.count, 4);
    let reasons: Vec<RecordRejection> = invalid.samples.iter().map(|s| s.reason).collect();
    assert_eq!(
        reasons,
        vec![
            RecordRejection::InvalidTimestampOrValue,
            RecordRejection::InvalidUserId,
            RecordRejection::InvalidTimestampOrValue,
            RecordRejection::ParseError,
        ]
    );
}

#[tokio::test]
async fn test_reupload_replaces_previous_series() {
    let repo = Arc::new(InMemoryHeartRateRepository::new());
    let service = IngestionService::new(repo.clone(), &IngestionConfig::default());

    service
        .run(std::io::Cursor::new(
            b"u1,2024-01-01T08:00:00Z,60\nu1,2024-01-01T08:30:00Z,90\n".to_vec(),
        ))
        .await
        .unwrap();
    service
        .run(std::io::Cursor::new(b"u1,2024-02-01T08:00:00Z,75\n".to_vec()))
        .await
        .unwrap();

    assert_eq!(
        stored(&repo, "u1").await,
        Some(vec![Reading::new(
            Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap(),
            75
        )])
    );
}
