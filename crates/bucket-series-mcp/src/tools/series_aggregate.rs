//! Tool: series_aggregate. Zero-filled, time-bucketed sums over the store.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::{json, Value};

use crate::session::StoreSession;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "series_aggregate".to_string(),
        description: Some(
            "Sum event values into hour, day, or month buckets between two timestamps (inclusive), \
             returning {dataset, labels} with empty buckets as 0"
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "dt_from": {
                    "type": "string",
                    "description": "Range start, YYYY-MM-DDTHH:MM:SS"
                },
                "dt_upto": {
                    "type": "string",
                    "description": "Range end (inclusive), YYYY-MM-DDTHH:MM:SS"
                },
                "group_type": {
                    "type": "string",
                    "enum": ["hour", "day", "month"]
                }
            },
            "required": ["dt_from", "dt_upto", "group_type"]
        }),
    }
}

pub async fn execute(args: Value, session: &Arc<Mutex<StoreSession>>) -> McpResult<ToolCallResult> {
    let session = session.lock().await;
    let series = session.aggregate(&args)?;
    Ok(ToolCallResult::json(&series))
}
