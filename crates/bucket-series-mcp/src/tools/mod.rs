//! MCP tool implementations.

pub mod events_ingest;
pub mod registry;
pub mod series_aggregate;
pub mod store_stats;

pub use registry::ToolRegistry;
