use common::domain::{DomainError, DomainResult};
use common::garde::validate_struct;
use garde::Validate;

pub const DEFAULT_BUCKET_MINUTES: u32 = 5;
pub const DEFAULT_MIN_BPM: i32 = 30;
pub const DEFAULT_MAX_BPM: i32 = 250;
pub const DEFAULT_INVALID_SAMPLE_LIMIT: usize = 5;

/// Tunables for validation, downsampling and reporting
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct IngestionConfig {
    /// Downsampling bucket width in minutes
    #[garde(range(min = 1, max = 1440))]
    pub bucket_minutes: u32,
    /// Lowest accepted heart rate, inclusive
    #[garde(range(min = 1))]
    pub min_bpm: i32,
    /// Highest accepted heart rate, inclusive
    #[garde(range(min = 1))]
    pub max_bpm: i32,
    /// How many rejected records are echoed back in a report
    #[garde(range(min = 1))]
    pub invalid_sample_limit: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            bucket_minutes: DEFAULT_BUCKET_MINUTES,
            min_bpm: DEFAULT_MIN_BPM,
            max_bpm: DEFAULT_MAX_BPM,
            invalid_sample_limit: DEFAULT_INVALID_SAMPLE_LIMIT,
        }
    }
}

impl IngestionConfig {
    pub fn ensure_valid(&self) -> DomainResult<()> {
        validate_struct(self)?;
        if self.min_bpm > self.max_bpm {
            return Err(DomainError::ValidationError(format!(
                "min_bpm ({}) must not exceed max_bpm ({})",
                self.min_bpm, self.max_bpm
            )));
        }
        Ok(())
    }

    pub fn bucket_width(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.bucket_minutes))
    }
}
