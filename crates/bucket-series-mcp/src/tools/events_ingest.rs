//! Tool: events_ingest. Append timestamped values to the store.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use bucket_series::{parse_timestamp, Event};

use crate::session::StoreSession;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct IngestParams {
    events: Vec<RawEvent>,
}

/// An event as submitted by a client, before timestamp parsing.
#[derive(Debug, Deserialize)]
pub struct RawEvent {
    pub dt: String,
    pub value: f64,
}

/// Parse submitted events with the strict `YYYY-MM-DDTHH:MM:SS` format.
///
/// Fails on the first bad timestamp, so nothing is ingested from a batch
/// that holds one.
pub fn parse_events(raw: Vec<RawEvent>) -> McpResult<Vec<Event>> {
    raw.into_iter()
        .map(|raw| -> McpResult<Event> { Ok(Event::new(parse_timestamp(&raw.dt)?, raw.value)) })
        .collect()
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "events_ingest".to_string(),
        description: Some("Append timestamped numeric events to the store".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "events": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "dt": { "type": "string", "description": "YYYY-MM-DDTHH:MM:SS" },
                            "value": { "type": "number" }
                        },
                        "required": ["dt", "value"]
                    }
                }
            },
            "required": ["events"]
        }),
    }
}

pub async fn execute(args: Value, session: &Arc<Mutex<StoreSession>>) -> McpResult<ToolCallResult> {
    let params: IngestParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    // Parse everything first so a bad entry leaves the store untouched.
    let events = parse_events(params.events)?;

    let mut session = session.lock().await;
    let result = session.ingest(events)?;

    Ok(ToolCallResult::json(&json!({
        "inserted": result.inserted,
        "total": result.total,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(dt: &str, value: f64) -> RawEvent {
        RawEvent {
            dt: dt.to_string(),
            value,
        }
    }

    #[test]
    fn test_parse_events() {
        let events =
            parse_events(vec![raw("2022-09-01T00:00:00", 1.5), raw("2022-09-01T03:30:00", 2.0)])
                .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].value, 2.0);
        assert_eq!(events[1].dt, parse_timestamp("2022-09-01T03:30:00").unwrap());
    }

    #[test]
    fn test_parse_events_rejects_fractional_seconds() {
        let err = parse_events(vec![
            raw("2022-09-01T00:00:00", 1.0),
            raw("2022-09-01T00:00:00.250", 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }

    #[test]
    fn test_parse_events_from_import_file() {
        let file = r#"[{"dt": "2022-09-01T00:00:00", "value": 3}, {"dt": "2022-09-01", "value": 1}]"#;
        let raw: Vec<RawEvent> = serde_json::from_str(file).unwrap();
        assert!(parse_events(raw).is_err());
    }
}
