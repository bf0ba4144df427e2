//! bucket-series: calendar-aware time bucketing and zero-filled aggregation over event stores.

pub mod aggregate;
pub mod buckets;
pub mod storage;
pub mod store;
pub mod types;
pub mod validate;

pub use aggregate::{aggregate, aggregate_json, aggregate_params};
pub use buckets::{bucket_range, bucket_range_named, days_in_month, BucketRange};
pub use storage::{EventFileReader, EventFileWriter};
pub use store::{EventStore, MemoryEventStore, RangeQuery};
pub use types::*;
pub use validate::{parse_timestamp, validate_request, REQUIRED_FIELDS};
