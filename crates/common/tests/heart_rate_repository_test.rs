#![cfg(feature = "integration-tests")]

use chrono::{TimeZone, Utc};
use common::domain::{GetReadingsInput, HeartRateRepository, Reading, UpsertReadingsInput};
use common::postgres::{PostgresClient, PostgresHeartRateRepository};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;

async fn setup_test_db() -> (ContainerAsync<Postgres>, PostgresHeartRateRepository) {
    let postgres = Postgres::default().start().await.unwrap();
    let host = postgres.get_host().await.unwrap();
    let port = postgres.get_host_port_ipv4(5432).await.unwrap();

    let client = PostgresClient::new(
        &host.to_string(),
        port,
        "postgres",
        "postgres",
        "postgres",
        5,
    )
    .expect("Failed to create client");

    client.run_migrations().await.expect("Migrations failed");

    (postgres, PostgresHeartRateRepository::new(client))
}

fn reading(minute: u32, value: i32) -> Reading {
    Reading::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap(), value)
}

#[tokio::test]
async fn test_upsert_creates_and_fully_replaces() {
    let (_container, repo) = setup_test_db().await;

    repo.upsert_readings(UpsertReadingsInput {
        user_id: "user-001".to_string(),
        readings: vec![reading(0, 62), reading(5, 70)],
    })
    .await
    .unwrap();

    let first = repo
        .get_readings(GetReadingsInput {
            user_id: "user-001".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(first, Some(vec![reading(0, 62), reading(5, 70)]));

    repo.upsert_readings(UpsertReadingsInput {
        user_id: "user-001".to_string(),
        readings: vec![reading(30, 88)],
    })
    .await
    .unwrap();

    let second = repo
        .get_readings(GetReadingsInput {
            user_id: "user-001".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(second, Some(vec![reading(30, 88)]));
}

#[tokio::test]
async fn test_get_readings_for_unknown_user() {
    let (_container, repo) = setup_test_db().await;

    let stored = repo
        .get_readings(GetReadingsInput {
            user_id: "missing".to_string(),
        })
        .await
        .unwrap();

    assert!(stored.is_none());
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let (container, _repo) = setup_test_db().await;
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();

    let client = PostgresClient::new(
        &host.to_string(),
        port,
        "postgres",
        "postgres",
        "postgres",
        2,
    )
    .unwrap();

    client.run_migrations().await.unwrap();
    client.ping().await.unwrap();
}
