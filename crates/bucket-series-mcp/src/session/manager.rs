//! Owns the event store, its backing file, and save scheduling.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde_json::Value;

use bucket_series::{
    aggregate, AggregatedSeries, Event, EventFileReader, EventFileWriter, MemoryEventStore,
};

use crate::types::{McpError, McpResult};

const DEFAULT_AUTO_SAVE_SECS: u64 = 30;

/// Manages the event store lifecycle, file I/O, and dirty tracking.
pub struct StoreSession {
    store: MemoryEventStore,
    file_path: PathBuf,
    dirty: bool,
    last_save: Instant,
    auto_save_interval: Duration,
}

impl StoreSession {
    /// Open or create a store file at the given path.
    pub fn open(path: &str) -> McpResult<Self> {
        let file_path = PathBuf::from(path);

        let store = if file_path.exists() {
            tracing::info!("Opening existing store file: {}", file_path.display());
            EventFileReader::read_from_file(&file_path)
                .map_err(|e| McpError::StoreError(format!("Failed to read store file: {e}")))?
        } else {
            tracing::info!("Creating new store file: {}", file_path.display());
            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    McpError::Io(std::io::Error::other(format!(
                        "Failed to create directory {}: {e}",
                        parent.display()
                    )))
                })?;
            }
            MemoryEventStore::new()
        };

        tracing::info!("Store has {} events", store.count());

        Ok(Self {
            store,
            file_path,
            dirty: false,
            last_save: Instant::now(),
            auto_save_interval: Duration::from_secs(DEFAULT_AUTO_SAVE_SECS),
        })
    }

    pub fn store(&self) -> &MemoryEventStore {
        &self.store
    }

    /// Run one aggregation request against the store.
    pub fn aggregate(&self, data: &Value) -> McpResult<AggregatedSeries> {
        Ok(aggregate(&self.store, data)?)
    }

    /// Append events and schedule a save.
    ///
    /// Once appended the events stay in memory. A failed auto-save leaves the
    /// session dirty for the next save attempt.
    pub fn ingest(&mut self, events: Vec<Event>) -> McpResult<IngestResult> {
        let inserted = self.store.extend(events);
        if inserted > 0 {
            self.dirty = true;
            self.maybe_auto_save();
        }
        tracing::debug!("Ingested {inserted} events, store now holds {}", self.store.count());

        Ok(IngestResult {
            inserted,
            total: self.store.count(),
        })
    }

    /// Save to file if anything changed since the last save.
    pub fn save(&mut self) -> McpResult<()> {
        if !self.dirty {
            return Ok(());
        }

        EventFileWriter::write_to_file(&self.store, &self.file_path)
            .map_err(|e| McpError::StoreError(format!("Failed to write store file: {e}")))?;

        self.dirty = false;
        self.last_save = Instant::now();
        tracing::debug!("Saved store file: {}", self.file_path.display());
        Ok(())
    }

    fn maybe_auto_save(&mut self) {
        if self.dirty && self.last_save.elapsed() >= self.auto_save_interval {
            if let Err(e) = self.save() {
                tracing::error!("Auto-save failed: {e}");
            }
        }
    }

    pub fn set_auto_save_interval(&mut self, interval: Duration) {
        self.auto_save_interval = interval;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn file_path(&self) -> &PathBuf {
        &self.file_path
    }
}

impl Drop for StoreSession {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.save() {
                tracing::error!("Failed to save on drop: {e}");
            }
        }
    }
}

/// Result of an ingest operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestResult {
    pub inserted: usize,
    pub total: usize,
}
