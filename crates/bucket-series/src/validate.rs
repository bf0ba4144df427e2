//! Request validation and parameter parsing.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::types::{Granularity, QueryParams, SeriesError, SeriesResult, TIMESTAMP_FORMAT};

/// Keys every aggregation request must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["dt_from", "dt_upto", "group_type"];

/// Check the shape of a raw request without parsing its timestamps.
pub fn validate_request(data: &Value) -> SeriesResult<()> {
    let map = data.as_object().ok_or_else(|| {
        SeriesError::TypeMismatch(format!(
            "expected a mapping, got {}",
            json_type_name(data)
        ))
    })?;

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|key| !map.contains_key(**key)) {
        return Err(SeriesError::MissingField(format!(
            "missing required key \"{missing}\""
        )));
    }

    match &map["group_type"] {
        Value::String(s) => s.parse::<Granularity>().map(|_| ()),
        other => Err(SeriesError::InvalidEnumValue(format!(
            "invalid value of \"group_type\": {other}"
        ))),
    }
}

/// Parse one timestamp in the fixed request format.
pub fn parse_timestamp(raw: &str) -> SeriesResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| {
        SeriesError::MalformedTimestamp(format!(
            "\"{raw}\" does not match {TIMESTAMP_FORMAT}: {e}"
        ))
    })
}

impl QueryParams {
    /// Validate a raw request and parse it into typed parameters.
    pub fn from_value(data: &Value) -> SeriesResult<Self> {
        validate_request(data)?;

        let dt_from = timestamp_field(data, "dt_from")?;
        let dt_upto = timestamp_field(data, "dt_upto")?;
        let granularity = match &data["group_type"] {
            Value::String(s) => s.parse::<Granularity>()?,
            other => {
                return Err(SeriesError::InvalidEnumValue(format!(
                    "invalid value of \"group_type\": {other}"
                )))
            }
        };

        Ok(Self {
            dt_from,
            dt_upto,
            granularity,
        })
    }
}

fn timestamp_field(data: &Value, key: &str) -> SeriesResult<NaiveDateTime> {
    match &data[key] {
        Value::String(raw) => parse_timestamp(raw),
        other => Err(SeriesError::MalformedTimestamp(format!(
            "\"{key}\" must be a string, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(group_type: Value) -> Value {
        json!({
            "dt_from": "2022-09-01T00:00:00",
            "dt_upto": "2022-12-31T23:59:00",
            "group_type": group_type,
        })
    }

    #[test]
    fn test_valid_request() {
        for g in ["hour", "day", "month"] {
            validate_request(&request(json!(g))).unwrap();
        }
    }

    #[test]
    fn test_non_mapping_rejected() {
        for data in [json!([1, 2]), json!(null), json!("x"), json!(3)] {
            let err = validate_request(&data).unwrap_err();
            assert!(matches!(err, SeriesError::TypeMismatch(_)), "{data}: {err}");
        }
        let err = validate_request(&json!([])).unwrap_err();
        assert!(err.to_string().contains("got array"));
    }

    #[test]
    fn test_missing_field() {
        let err = validate_request(&json!({
            "dt_from": "2022-09-01T00:00:00",
            "group_type": "day",
        }))
        .unwrap_err();
        assert!(matches!(err, SeriesError::MissingField(ref m) if m.contains("dt_upto")));
    }

    #[test]
    fn test_invalid_group_type() {
        let err = validate_request(&request(json!("week"))).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidEnumValue(ref m) if m.contains("week")));

        let err = validate_request(&request(json!(7))).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidEnumValue(ref m) if m.contains('7')));
    }

    #[test]
    fn test_validation_ignores_timestamps() {
        let data = json!({"dt_from": "yesterday", "dt_upto": 5, "group_type": "day"});
        validate_request(&data).unwrap();

        let err = QueryParams::from_value(&data).unwrap_err();
        assert!(matches!(err, SeriesError::MalformedTimestamp(ref m) if m.contains("yesterday")));
    }

    #[test]
    fn test_from_value() {
        let params = QueryParams::from_value(&request(json!("month"))).unwrap();
        assert_eq!(params.granularity, Granularity::Month);
        assert_eq!(
            params.dt_upto.format(TIMESTAMP_FORMAT).to_string(),
            "2022-12-31T23:59:00"
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_other_formats() {
        assert!(parse_timestamp("2022-09-01 00:00:00").is_err());
        assert!(parse_timestamp("2022-09-01").is_err());
        assert!(parse_timestamp("2022-02-30T00:00:00").is_err());
        assert!(parse_timestamp("2022-09-01T00:00:00").is_ok());
    }
}
