use crate::domain::IngestionConfig;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use common::domain::{RawRecord, Reading, RecordRejection};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Classifies raw CSV triples as readings or rejections.
///
/// Rules run in order and stop at the first failure:
/// 1. the user id is non-empty after trimming
/// 2. the timestamp parses as a calendar instant
/// 3. the value parses as an integer
/// 4. the value lies within `[min_bpm, max_bpm]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordValidator {
    min_bpm: i32,
    max_bpm: i32,
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::from_config(&IngestionConfig::default())
    }
}

impl RecordValidator {
    pub fn new(min_bpm: i32, max_bpm: i32) -> Self {
        Self { min_bpm, max_bpm }
    }

    pub fn from_config(config: &IngestionConfig) -> Self {
        Self::new(config.min_bpm, config.max_bpm)
    }

    pub fn validate(&self, raw: &RawRecord) -> Result<Reading, RecordRejection> {
        if raw.user_id.trim().is_empty() {
            return Err(RecordRejection::InvalidUserId);
        }

        let timestamp =
            parse_timestamp(&raw.timestamp).ok_or(RecordRejection::InvalidTimestampOrValue)?;
        let value = parse_value(&raw.value).ok_or(RecordRejection::InvalidTimestampOrValue)?;

        if !(self.min_bpm..=self.max_bpm).contains(&value) {
            return Err(RecordRejection::InvalidTimestampOrValue);
        }

        Ok(Reading::new(timestamp, value))
    }
}

/// Parse an ISO-8601-like timestamp. Values without an offset are taken as UTC,
/// a bare date as UTC midnight.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Parse a whole decimal integer; fractions and trailing characters are rejected
pub fn parse_value(input: &str) -> Option<i32> {
    input.trim().parse().ok()
}
