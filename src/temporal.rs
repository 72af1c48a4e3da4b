//! Temporal bucketing and encoding.
//!
//! Two independent encodings coexist. The numeric time-bin id groups records
//! into per-bucket batches before spatial partitioning. The multi-scale
//! lexicographic key is a human-inspectable, range-scannable string prefix
//! for callers that key directly on calendar time. Both interpret
//! timestamps as UTC epoch milliseconds so every caller sees one canonical
//! ordering.

use crate::error::{IndexError, Result};
use crate::types::Trajectory;
use chrono::{DateTime, Datelike, Utc};

/// Numeric time-bin encoder: `TR(i, j) = i * N + (j - i)`.
///
/// `i` and `j` are the start and end period indexes of a record's time span;
/// spans longer than `N` periods are clamped in the encoding only, never in
/// the underlying record.
#[derive(Debug, Clone, Copy)]
pub struct TimeBinEncoder {
    period_ms: i64,
    max_span: i64,
}

impl TimeBinEncoder {
    /// Create an encoder for period length `P` (milliseconds) and maximum
    /// bin span `N` (periods).
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Configuration`] unless both are positive.
    pub fn new(period_ms: i64, max_span: i64) -> Result<Self> {
        if period_ms <= 0 {
            return Err(IndexError::Configuration(format!(
                "period length must be positive, got {period_ms} ms"
            )));
        }
        if max_span <= 0 {
            return Err(IndexError::Configuration(format!(
                "max span must be positive, got {max_span}"
            )));
        }
        Ok(Self {
            period_ms,
            max_span,
        })
    }

    pub fn period_ms(&self) -> i64 {
        self.period_ms
    }

    pub fn max_span(&self) -> i64 {
        self.max_span
    }

    /// Period index `floor(timestamp / P)`.
    ///
    /// Euclidean division, so pre-epoch timestamps keep their chronological
    /// order instead of rounding toward zero.
    pub fn period_index(&self, timestamp_ms: i64) -> i64 {
        timestamp_ms.div_euclid(self.period_ms)
    }

    /// Encode a `[start, end]` time span as a bin id.
    ///
    /// The span in periods is clamped to `N - 1` when it would reach `N`;
    /// only the encoding is clamped.
    pub fn encode_span(&self, start_ms: i64, end_ms: i64) -> i64 {
        let i = self.period_index(start_ms);
        let mut j = self.period_index(end_ms.max(start_ms));
        if j - i >= self.max_span {
            j = i + self.max_span - 1;
        }
        i * self.max_span + (j - i)
    }

    /// Bin id for an instant (a span of zero periods).
    pub fn encode_timestamp(&self, timestamp_ms: i64) -> i64 {
        self.encode_span(timestamp_ms, timestamp_ms)
    }

    /// Bin id for a trajectory's cached `[start, end]` span.
    pub fn encode_trajectory(&self, trajectory: &Trajectory) -> i64 {
        self.encode_span(trajectory.start_ms(), trajectory.end_ms())
    }
}

/// Width of the zero-padded period-index field in the multi-scale key.
const PERIOD_FIELD_WIDTH: u32 = 12;

/// Multi-scale lexicographic time key:
/// `months-since-epoch (4) || day-of-year (3) || period-index (12)`.
///
/// Fields are concatenated in descending granularity and zero-padded to
/// fixed widths, so byte ordering of the key equals chronological ordering
/// of the source timestamps. The calendar fields are derived in UTC.
#[derive(Debug, Clone, Copy)]
pub struct MultiScaleTimeKey {
    period_ms: i64,
}

impl MultiScaleTimeKey {
    /// Create a key generator for the given minimal period length.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Configuration`] for a non-positive period.
    pub fn new(period_ms: i64) -> Result<Self> {
        if period_ms <= 0 {
            return Err(IndexError::Configuration(format!(
                "period length must be positive, got {period_ms} ms"
            )));
        }
        Ok(Self { period_ms })
    }

    /// Generate the lexicographic key prefix for a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidTimestamp`] for pre-epoch timestamps or
    /// a period index that does not fit the fixed field width (only
    /// reachable with sub-second periods in the very far future).
    pub fn key_prefix(&self, timestamp_ms: i64) -> Result<String> {
        if timestamp_ms < 0 {
            return Err(IndexError::InvalidTimestamp(timestamp_ms));
        }
        let datetime: DateTime<Utc> = DateTime::from_timestamp_millis(timestamp_ms)
            .ok_or(IndexError::InvalidTimestamp(timestamp_ms))?;

        // Months since epoch, 1-based within the year: 1970-01 encodes as 1.
        let months = (datetime.year() - 1970) * 12 + datetime.month() as i32;
        let day_of_year = datetime.ordinal();
        let period = timestamp_ms / self.period_ms;
        if period >= 10i64.pow(PERIOD_FIELD_WIDTH) {
            return Err(IndexError::InvalidTimestamp(timestamp_ms));
        }

        Ok(format!("{months:04}{day_of_year:03}{period:012}"))
    }
}
