use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// A single validated heart-rate observation in beats per minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: i32,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, value: i32) -> Self {
        Self { timestamp, value }
    }
}

/// One CSV row exactly as received, before any parsing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub user_id: String,
    pub timestamp: String,
    pub value: String,
}

impl RawRecord {
    pub fn new(
        user_id: impl Into<String>,
        timestamp: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp: timestamp.into(),
            value: value.into(),
        }
    }
}

/// Why a single record was left out of a user's reading set.
///
/// The display strings are part of the report contract.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRejection {
    #[error("Invalid user ID")]
    InvalidUserId,

    #[error("Invalid timestamp or value")]
    InvalidTimestampOrValue,

    #[error("Parse error")]
    ParseError,
}

impl Serialize for RecordRejection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A rejected row, kept with its original field values for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidRecord {
    #[serde(flatten)]
    pub raw: RawRecord,
    pub reason: RecordRejection,
}

impl InvalidRecord {
    pub fn new(raw: RawRecord, reason: RecordRejection) -> Self {
        Self { raw, reason }
    }
}
