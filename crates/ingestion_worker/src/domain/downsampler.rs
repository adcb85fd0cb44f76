use crate::domain::IngestionConfig;
use chrono::{DateTime, Duration, Utc};
use common::domain::Reading;

/// Reduces a user's readings to one averaged reading per populated time bucket.
///
/// Buckets are anchored at the earliest reading and advance in whole multiples of the
/// bucket width, so the left edges are `min_timestamp + k * width`, never wall-clock
/// aligned. Empty buckets are skipped rather than zero-filled. Each emitted reading
/// carries the bucket's left edge and the half-up rounded mean of its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Downsampler {
    bucket_width: Duration,
}

impl Default for Downsampler {
    fn default() -> Self {
        Self::from_config(&IngestionConfig::default())
    }
}

impl Downsampler {
    /// `bucket_width` must be positive; `IngestionConfig::ensure_valid` guarantees this
    /// for configured widths.
    pub fn new(bucket_width: Duration) -> Self {
        debug_assert!(bucket_width > Duration::zero());
        Self { bucket_width }
    }

    pub fn from_config(config: &IngestionConfig) -> Self {
        Self::new(config.bucket_width())
    }

    pub fn bucket_width(&self) -> Duration {
        self.bucket_width
    }

    pub fn reduce(&self, readings: &[Reading]) -> Vec<Reading> {
        let mut sorted = readings.to_vec();
        sorted.sort_by_key(|r| r.timestamp);

        let mut iter = sorted.into_iter();
        let Some(first) = iter.next() else {
            return Vec::new();
        };

        let mut reduced = Vec::new();
        let mut bucket = Bucket::open(first.timestamp, first.value);

        for reading in iter {
            if reading.timestamp < bucket.left + self.bucket_width {
                bucket.add(reading.value);
                continue;
            }
            let left = self.advance(bucket.left, reading.timestamp);
            reduced.extend(bucket.close());
            bucket = Bucket::open(left, reading.value);
        }

        reduced.extend(bucket.close());
        reduced
    }

    /// Smallest `left + k * width` (k >= 1) whose bucket contains `timestamp`.
    fn advance(&self, left: DateTime<Utc>, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let width_ms = self.bucket_width.num_milliseconds().max(1);
        let steps = (timestamp - left).num_milliseconds() / width_ms;
        let mut next = left + Duration::milliseconds(steps * width_ms);
        while timestamp >= next + self.bucket_width {
            next += self.bucket_width;
        }
        while timestamp < next {
            next -= self.bucket_width;
        }
        next
    }
}

struct Bucket {
    left: DateTime<Utc>,
    sum: i64,
    count: i64,
}

impl Bucket {
    fn open(left: DateTime<Utc>, value: i32) -> Self {
        Self {
            left,
            sum: i64::from(value),
            count: 1,
        }
    }

    fn add(&mut self, value: i32) {
        self.sum += i64::from(value);
        self.count += 1;
    }

    fn close(self) -> Option<Reading> {
        if self.count == 0 {
            return None;
        }
        Some(Reading::new(self.left, round_half_up_mean(self.sum, self.count)))
    }
}

/// `floor(sum / count + 0.5)` without floating point
fn round_half_up_mean(sum: i64, count: i64) -> i32 {
    (2 * sum + count).div_euclid(2 * count) as i32
}
