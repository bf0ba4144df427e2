//! Event store session lifecycle and file I/O.

pub mod manager;

pub use manager::{IngestResult, StoreSession};
