//! Tool registration and dispatch.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;

use crate::session::StoreSession;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{events_ingest, series_aggregate, store_stats};

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            series_aggregate::definition(),
            events_ingest::definition(),
            store_stats::definition(),
        ]
    }

    pub async fn call(
        name: &str,
        arguments: Option<Value>,
        session: &Arc<Mutex<StoreSession>>,
    ) -> McpResult<ToolCallResult> {
        // Absent arguments stay null so the aggregator reports the type mismatch.
        let args = arguments.unwrap_or(Value::Null);

        tracing::debug!("Calling tool {name}");
        match name {
            "series_aggregate" => series_aggregate::execute(args, session).await,
            "events_ingest" => events_ingest::execute(args, session).await,
            "store_stats" => store_stats::execute(args, session).await,
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }
}
