//! bucket-series MCP server: time-bucketed aggregation over a persistent event store.

pub mod config;
pub mod protocol;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::resolve_store_path;
pub use protocol::ProtocolHandler;
pub use session::StoreSession;
pub use transport::StdioTransport;
