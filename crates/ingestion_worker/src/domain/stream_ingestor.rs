use crate::domain::{IngestionConfig, RecordValidator};
use common::domain::{DomainError, DomainResult, InvalidRecord, RawRecord, Reading, RecordRejection};
use csv::{ByteRecord, ReaderBuilder};
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, instrument};

/// Result of one pass over an upload: valid readings grouped by user plus every rejected row
#[derive(Debug, Default)]
pub struct IngestedReadings {
    pub readings_by_user: HashMap<String, Vec<Reading>>,
    pub invalid: Vec<InvalidRecord>,
}

impl IngestedReadings {
    pub fn valid_count(&self) -> usize {
        self.readings_by_user.values().map(Vec::len).sum()
    }
}

/// Single-pass CSV reader for headerless `userId,timestamp,value` rows.
///
/// Rows are read one at a time from the underlying reader; only the grouped readings
/// are retained. Malformed rows become `InvalidRecord`s; only I/O failures abort.
#[derive(Debug, Clone, Default)]
pub struct StreamIngestor {
    validator: RecordValidator,
}

impl StreamIngestor {
    pub fn new(validator: RecordValidator) -> Self {
        Self { validator }
    }

    pub fn from_config(config: &IngestionConfig) -> Self {
        Self::new(RecordValidator::from_config(config))
    }

    #[instrument(skip_all)]
    pub fn ingest<R: Read>(&self, reader: R) -> DomainResult<IngestedReadings> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut ingested = IngestedReadings::default();
        let mut record = ByteRecord::new();

        loop {
            match csv_reader.read_byte_record(&mut record) {
                Ok(true) => self.route(&record, &mut ingested),
                Ok(false) => break,
                Err(e) if e.is_io_error() => {
                    return Err(DomainError::StreamReadError(e.to_string()));
                }
                Err(e) => {
                    debug!(error = %e, "unreadable CSV row");
                    ingested
                        .invalid
                        .push(InvalidRecord::new(RawRecord::default(), RecordRejection::ParseError));
                }
            }
        }

        debug!(
            users = ingested.readings_by_user.len(),
            valid_count = ingested.valid_count(),
            invalid_count = ingested.invalid.len(),
            "finished reading upload stream"
        );

        Ok(ingested)
    }

    fn route(&self, record: &ByteRecord, ingested: &mut IngestedReadings) {
        let line = record.position().map(|p| p.line());

        let raw = match decode_record(record) {
            Ok(raw) => raw,
            Err(raw) => {
                debug!(?line, "row could not be split into three text fields");
                ingested
                    .invalid
                    .push(InvalidRecord::new(raw, RecordRejection::ParseError));
                return;
            }
        };

        match self.validator.validate(&raw) {
            Ok(reading) => {
                ingested
                    .readings_by_user
                    .entry(raw.user_id.trim().to_string())
                    .or_default()
                    .push(reading);
            }
            Err(reason) => {
                debug!(?line, %reason, "rejected row");
                ingested.invalid.push(InvalidRecord::new(raw, reason));
            }
        }
    }
}

/// Split a CSV row into its three raw fields. Fields past the third are ignored.
///
/// On failure the returned record still holds whatever could be recovered,
/// lossily decoded, for the invalid-record report.
fn decode_record(record: &ByteRecord) -> Result<RawRecord, RawRecord> {
    let field = |i: usize| record.get(i).map(std::str::from_utf8);

    match (field(0), field(1), field(2)) {
        (Some(Ok(user_id)), Some(Ok(timestamp)), Some(Ok(value))) => {
            Ok(RawRecord::new(user_id, timestamp, value))
        }
        _ => {
            let lossy = |i: usize| {
                record
                    .get(i)
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    .unwrap_or_default()
            };
            Err(RawRecord::new(lossy(0), lossy(1), lossy(2)))
        }
    }
}
