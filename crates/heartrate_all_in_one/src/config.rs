use config::{Config, ConfigError, Environment};
use ingestion_worker::domain::{
    IngestionConfig, DEFAULT_BUCKET_MINUTES, DEFAULT_INVALID_SAMPLE_LIMIT, DEFAULT_MAX_BPM,
    DEFAULT_MIN_BPM,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where reduced series are persisted
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // Store configuration
    /// Persistence backend: "postgres" or "memory"
    #[serde(default = "default_store_backend")]
    pub store_backend: StoreBackend,

    // PostgreSQL configuration
    /// PostgreSQL host
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    /// PostgreSQL port
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    /// PostgreSQL database name
    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    /// PostgreSQL username
    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    /// PostgreSQL password
    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    /// Maximum pooled PostgreSQL connections
    #[serde(default = "default_postgres_max_pool_size")]
    pub postgres_max_pool_size: usize,

    // Upload spool configuration
    /// Directory uploaded CSV files are dropped into
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Directory for JSON ingestion reports; reports are only logged when unset
    #[serde(default)]
    pub report_dir: Option<String>,

    /// How often the upload directory is scanned, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    // Pipeline configuration
    /// Downsampling bucket width in minutes
    #[serde(default = "default_bucket_minutes")]
    pub bucket_minutes: u32,

    /// Lowest accepted heart rate (inclusive)
    #[serde(default = "default_min_bpm")]
    pub min_bpm: i32,

    /// Highest accepted heart rate (inclusive)
    #[serde(default = "default_max_bpm")]
    pub max_bpm: i32,

    /// Number of rejected rows echoed back in each report
    #[serde(default = "default_invalid_sample_limit")]
    pub invalid_sample_limit: usize,

    // OpenTelemetry configuration
    /// OpenTelemetry OTLP endpoint (gRPC)
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    /// Enable OpenTelemetry export
    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    /// Service name for OpenTelemetry resource
    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Postgres
}

// PostgreSQL defaults
fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "heartrate".to_string()
}

fn default_postgres_username() -> String {
    "heartrate".to_string()
}

fn default_postgres_password() -> String {
    "heartrate".to_string()
}

fn default_postgres_max_pool_size() -> usize {
    5
}

// Upload spool defaults
fn default_upload_dir() -> String {
    "./public/temp".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

// Pipeline defaults
fn default_bucket_minutes() -> u32 {
    DEFAULT_BUCKET_MINUTES
}

fn default_min_bpm() -> i32 {
    DEFAULT_MIN_BPM
}

fn default_max_bpm() -> i32 {
    DEFAULT_MAX_BPM
}

fn default_invalid_sample_limit() -> usize {
    DEFAULT_INVALID_SAMPLE_LIMIT
}

// OpenTelemetry defaults
fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_enabled() -> bool {
    false
}

fn default_otel_service_name() -> String {
    "heartrate-all-in-one".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("HEARTRATE"))
            .build()?
            .try_deserialize()
    }

    pub fn ingestion_config(&self) -> IngestionConfig {
        IngestionConfig {
            bucket_minutes: self.bucket_minutes,
            min_bpm: self.min_bpm,
            max_bpm: self.max_bpm,
            invalid_sample_limit: self.invalid_sample_limit,
        }
    }

    pub fn report_dir(&self) -> Option<PathBuf> {
        self.report_dir
            .as_deref()
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
    }
}
