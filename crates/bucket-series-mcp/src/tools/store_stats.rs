//! Tool: store_stats. Summary of the event store.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::{json, Value};

use bucket_series::TIMESTAMP_FORMAT;

use crate::session::StoreSession;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "store_stats".to_string(),
        description: Some("Event count, time span, and file location of the store".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub async fn execute(_args: Value, session: &Arc<Mutex<StoreSession>>) -> McpResult<ToolCallResult> {
    let session = session.lock().await;
    let store = session.store();
    let span = store.span().map(|(first, last)| {
        json!({
            "first": first.format(TIMESTAMP_FORMAT).to_string(),
            "last": last.format(TIMESTAMP_FORMAT).to_string(),
        })
    });

    Ok(ToolCallResult::json(&json!({
        "total_events": store.count(),
        "span": span,
        "created_at": unix_to_rfc3339(store.created_at),
        "updated_at": unix_to_rfc3339(store.updated_at),
        "unsaved_changes": session.is_dirty(),
        "file_path": session.file_path().display().to_string(),
    })))
}

fn unix_to_rfc3339(secs: u64) -> Option<String> {
    let secs = i64::try_from(secs).ok()?;
    chrono::DateTime::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339())
}
