mod downsampler;
mod ingestion_config;
mod ingestion_service;
mod record_validator;
mod stream_ingestor;
mod upload_guard;

pub use downsampler::*;
pub use ingestion_config::*;
pub use ingestion_service::*;
pub use record_validator::*;
pub use stream_ingestor::*;
pub use upload_guard::*;
