mod config;

use common::domain::{HeartRateRepository, InMemoryHeartRateRepository};
use common::postgres::{PostgresClient, PostgresHeartRateRepository};
use common::telemetry::{TelemetryConfig, TelemetryProviders, init_telemetry, shutdown_telemetry};
use crate::config::{ServiceConfig, StoreBackend};
use ingestion_worker::{IngestionWorker, IngestionWorkerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        store_backend = ?config.store_backend,
        "Starting heartrate-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    let repository = match create_repository(&config).await {
        Ok(repo) => repo,
        Err(e) => {
            error!("Failed to initialize heart-rate store: {:#}", e);
            shutdown_telemetry(telemetry_providers);
            std::process::exit(1);
        }
    };

    let worker = match IngestionWorker::new(
        repository,
        IngestionWorkerConfig {
            upload_dir: PathBuf::from(&config.upload_dir),
            report_dir: config.report_dir(),
            poll_interval_secs: config.poll_interval_secs,
            ingestion: config.ingestion_config(),
        },
    ) {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to initialize ingestion worker: {}", e);
            shutdown_telemetry(telemetry_providers);
            std::process::exit(1);
        }
    };

    let shutdown_token = CancellationToken::new();
    spawn_signal_handlers(shutdown_token.clone());

    let exit_code = match worker.run(shutdown_token).await {
        Ok(()) => {
            info!("Ingestion worker stopped");
            0
        }
        Err(e) => {
            error!("Ingestion worker failed: {:#}", e);
            1
        }
    };

    shutdown_telemetry(telemetry_providers);
    std::process::exit(exit_code);
}

async fn create_repository(config: &ServiceConfig) -> anyhow::Result<Arc<dyn HeartRateRepository>> {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory heart-rate store");
            Ok(Arc::new(InMemoryHeartRateRepository::new()))
        }
        StoreBackend::Postgres => {
            info!("Initializing PostgreSQL...");
            let client = PostgresClient::new(
                &config.postgres_host,
                config.postgres_port,
                &config.postgres_database,
                &config.postgres_username,
                &config.postgres_password,
                config.postgres_max_pool_size,
            )?;
            client.ping().await?;
            client.run_migrations().await?;
            Ok(Arc::new(PostgresHeartRateRepository::new(client)))
        }
    }
}

fn spawn_signal_handlers(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                ctrl_c_token.cancel();
            }
            Err(err) => error!("Error setting up signal handler: {}", err),
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM signal");
                token.cancel();
            }
            Err(err) => error!("Error setting up SIGTERM handler: {}", err),
        }
    });
}
