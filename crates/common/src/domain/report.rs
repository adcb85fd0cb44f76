use crate::domain::InvalidRecord;
use serde::Serialize;

pub const PROCESSED_MESSAGE: &str = "Data processed";
pub const FAILED_MESSAGE: &str = "Failed to process file";

/// Per-user outcome of one ingestion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: String,
    pub original_readings: usize,
    pub reduced_readings: usize,
    pub reduction_percentage: i64,
}

impl UserSummary {
    pub fn new(user_id: String, original_readings: usize, reduced_readings: usize) -> Self {
        Self {
            reduction_percentage: reduction_percentage(original_readings, reduced_readings),
            user_id,
            original_readings,
            reduced_readings,
        }
    }
}

/// `round((1 - reduced / original) * 100)` with half-up rounding, in integer arithmetic.
/// An empty original set reports no reduction.
pub fn reduction_percentage(original: usize, reduced: usize) -> i64 {
    if original == 0 {
        return 0;
    }
    let original = original as i64;
    let removed = original - reduced as i64;
    (200 * removed + original).div_euclid(2 * original)
}

/// Aggregate count of rejected records plus a bounded sample of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidReadingsReport {
    pub count: usize,
    pub samples: Vec<InvalidRecord>,
}

/// The structured result handed back to the caller of an ingestion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionReport {
    pub message: String,
    pub summary: Vec<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_readings: Option<InvalidReadingsReport>,
}

impl IngestionReport {
    /// Builds the report, keeping only the first `sample_limit` invalid records as samples.
    /// `invalid_readings` is omitted entirely when nothing was rejected.
    pub fn new(
        summary: Vec<UserSummary>,
        mut invalid: Vec<InvalidRecord>,
        sample_limit: usize,
    ) -> Self {
        let invalid_readings = if invalid.is_empty() {
            None
        } else {
            let count = invalid.len();
            invalid.truncate(sample_limit);
            Some(InvalidReadingsReport {
                count,
                samples: invalid,
            })
        };

        Self {
            message: PROCESSED_MESSAGE.to_string(),
            summary,
            invalid_readings,
        }
    }
}

/// Report emitted in place of an `IngestionReport` when a run aborts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub details: String,
}

impl ErrorReport {
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            error: FAILED_MESSAGE.to_string(),
            details: details.into(),
        }
    }
}
