//! Aggregation orchestration: validate, query the store, align onto buckets.

use std::collections::HashMap;

use serde_json::Value;

use crate::buckets::bucket_range;
use crate::store::{EventStore, RangeQuery};
use crate::types::{AggregatedSeries, QueryParams, SeriesError, SeriesResult};

/// Answer a raw aggregation request against a store.
///
/// Validation and timestamp parsing happen before the store is touched, so a
/// rejected request never reaches it. Buckets without any rows are filled
/// with zero.
pub fn aggregate<S: EventStore + ?Sized>(store: &S, data: &Value) -> SeriesResult<AggregatedSeries> {
    let params = QueryParams::from_value(data)?;
    aggregate_params(store, &params)
}

/// Same as [`aggregate`], returning the serialized wire form.
pub fn aggregate_json<S: EventStore + ?Sized>(store: &S, data: &Value) -> SeriesResult<String> {
    aggregate(store, data)?.to_json()
}

/// Aggregate with already-parsed parameters.
///
/// A row whose total is not finite (an overflowed sum, or NaN) fails the
/// request with [`SeriesError::Store`], since JSON has no encoding for it.
pub fn aggregate_params<S: EventStore + ?Sized>(
    store: &S,
    params: &QueryParams,
) -> SeriesResult<AggregatedSeries> {
    let granularity = params.granularity;
    let rows = store.aggregate(&RangeQuery {
        from: params.dt_from,
        upto: params.dt_upto,
        granularity,
    })?;
    let row_count = rows.len();

    // Later rows win on a repeated key.
    let mut totals: HashMap<String, f64> = HashMap::with_capacity(row_count);
    for row in rows {
        if !row.total.is_finite() {
            return Err(SeriesError::Store(format!(
                "bucket {} has non-finite total {}",
                row.bucket_key, row.total
            )));
        }
        totals.insert(row.bucket_key, row.total);
    }

    let buckets = bucket_range(params.dt_from, params.dt_upto, granularity);
    let mut series = AggregatedSeries::with_capacity(buckets.size_hint().0);
    for start in buckets {
        let total = totals
            .get(&granularity.bucket_key(&start))
            .copied()
            .unwrap_or(0.0);
        series.push(&start, total);
    }

    tracing::debug!(
        "Aggregated {} buckets at {granularity} granularity from {row_count} store rows",
        series.len()
    );

    Ok(series)
}
