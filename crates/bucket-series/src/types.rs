//! Core data types for events, granularities, and aggregated series.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

/// Fixed wire format for request timestamps and series labels.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Bucket-sizing mode for an aggregation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Month,
}

impl Granularity {
    /// All supported granularities, in ascending bucket size.
    pub const ALL: [Granularity; 3] = [Granularity::Hour, Granularity::Day, Granularity::Month];

    /// strftime pattern used to build bucket keys.
    pub const fn key_format(self) -> &'static str {
        match self {
            Self::Hour => "%Y-%m-%dT%H",
            Self::Day => "%Y-%m-%d",
            Self::Month => "%Y-%m",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Month => "month",
        }
    }

    /// Format an instant into the key of the bucket that contains it.
    pub fn bucket_key(self, dt: &NaiveDateTime) -> String {
        dt.format(self.key_format()).to_string()
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            other => Err(SeriesError::InvalidEnumValue(format!(
                "invalid value of \"group_type\": {other}"
            ))),
        }
    }
}

/// A single timestamped measurement held by an event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub dt: NaiveDateTime,
    pub value: f64,
}

impl Event {
    pub fn new(dt: NaiveDateTime, value: f64) -> Self {
        Self { dt, value }
    }
}

/// One grouped sum returned by the store for a non-empty bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub bucket_key: String,
    pub total: f64,
}

/// Parsed and validated aggregation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParams {
    pub dt_from: NaiveDateTime,
    pub dt_upto: NaiveDateTime,
    pub granularity: Granularity,
}

/// Dense, index-aligned output of an aggregation query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSeries {
    #[serde(serialize_with = "serialize_totals")]
    pub dataset: Vec<f64>,
    pub labels: Vec<String>,
}

impl AggregatedSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dataset: Vec::with_capacity(capacity),
            labels: Vec::with_capacity(capacity),
        }
    }

    /// Append one bucket: its start instant and its summed value.
    pub fn push(&mut self, start: &NaiveDateTime, total: f64) {
        self.dataset.push(total);
        self.labels.push(start.format(TIMESTAMP_FORMAT).to_string());
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Serialize to the `{"dataset": [...], "labels": [...]}` wire form.
    pub fn to_json(&self) -> SeriesResult<String> {
        serde_json::to_string(self)
            .map_err(|e| SeriesError::Storage(format!("Serialization failed: {e}")))
    }
}

// Whole-number sums go out as JSON integers so counts read as `0`, not `0.0`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

fn serialize_totals<S: Serializer>(totals: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(totals.len()))?;
    for total in totals {
        if total.is_finite() && total.fract() == 0.0 && total.abs() <= MAX_EXACT_INT {
            seq.serialize_element(&(*total as i64))?;
        } else {
            seq.serialize_element(total)?;
        }
    }
    seq.end()
}

/// Errors that can occur while validating, querying, or persisting.
#[derive(thiserror::Error, Debug)]
pub enum SeriesError {
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid enum value: {0}")]
    InvalidEnumValue(String),

    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeriesError {
    /// True for failures caused by the request itself rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SeriesError::TypeMismatch(_)
                | SeriesError::MissingField(_)
                | SeriesError::InvalidEnumValue(_)
                | SeriesError::MalformedTimestamp(_)
        )
    }
}

/// Convenience result type.
pub type SeriesResult<T> = Result<T, SeriesError>;
