//! .bkts binary file format reader/writer for event stores.

use std::io::{Read, Write};
use std::path::Path;

use crate::store::MemoryEventStore;
use crate::types::{Event, SeriesError, SeriesResult};

/// Magic bytes: "BKTS"
const BKTS_MAGIC: u32 = 0x424B5453;

/// Current format version.
const FORMAT_VERSION: u16 = 1;

/// Header size in bytes.
const HEADER_SIZE: usize = 64;

/// Writer for .bkts files.
pub struct EventFileWriter;

/// Reader for .bkts files.
pub struct EventFileReader;

impl EventFileWriter {
    /// Write an event store to a file, creating parent directories.
    pub fn write_to_file(store: &MemoryEventStore, path: &Path) -> SeriesResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::File::create(path)?;
        Self::write_to(store, &mut file)
    }

    /// Write an event store to any writer.
    pub fn write_to<W: Write>(store: &MemoryEventStore, writer: &mut W) -> SeriesResult<()> {
        let payload = serde_json::to_vec(&store.events)
            .map_err(|e| SeriesError::Storage(format!("Serialization failed: {e}")))?;

        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(&BKTS_MAGIC.to_le_bytes());
        header[4..6].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        // 6..8: flags, reserved
        header[8..16].copy_from_slice(&(store.events.len() as u64).to_le_bytes());
        header[16..24].copy_from_slice(&store.created_at.to_le_bytes());
        header[24..32].copy_from_slice(&store.updated_at.to_le_bytes());
        header[32..40].copy_from_slice(&(payload.len() as u64).to_le_bytes());

        writer.write_all(&header)?;
        writer.write_all(&payload)?;
        writer.flush()?;

        Ok(())
    }
}

impl EventFileReader {
    /// Read an event store from a file.
    pub fn read_from_file(path: &Path) -> SeriesResult<MemoryEventStore> {
        let mut file = std::fs::File::open(path)?;
        Self::read_from(&mut file)
    }

    /// Read an event store from any reader.
    pub fn read_from<R: Read>(reader: &mut R) -> SeriesResult<MemoryEventStore> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        let magic = read_u32(&header[0..4]);
        if magic != BKTS_MAGIC {
            return Err(SeriesError::Storage(format!(
                "Invalid magic: expected 0x{BKTS_MAGIC:08X}, got 0x{magic:08X}"
            )));
        }

        let version = read_u16(&header[4..6]);
        if version != FORMAT_VERSION {
            return Err(SeriesError::Storage(format!(
                "Unsupported version: {version}"
            )));
        }

        let event_count = read_u64(&header[8..16]) as usize;
        let created_at = read_u64(&header[16..24]);
        let updated_at = read_u64(&header[24..32]);
        let payload_len = read_u64(&header[32..40]);

        // The declared length is untrusted; read at most that many bytes.
        let mut payload = Vec::new();
        reader.take(payload_len).read_to_end(&mut payload)?;
        if payload.len() as u64 != payload_len {
            return Err(SeriesError::Storage(format!(
                "Truncated payload: header declares {payload_len} bytes, file holds {}",
                payload.len()
            )));
        }

        let events: Vec<Event> = serde_json::from_slice(&payload)
            .map_err(|e| SeriesError::Storage(format!("Deserialization failed: {e}")))?;

        if events.len() != event_count {
            return Err(SeriesError::Storage(format!(
                "Header declares {event_count} events, payload holds {}",
                events.len()
            )));
        }

        Ok(MemoryEventStore {
            events,
            created_at,
            updated_at,
        })
    }
}

fn read_u16(buf: &[u8]) -> u16 {
    u16::from_le_bytes([buf[0], buf[1]])
}
fn read_u32(buf: &[u8]) -> u32 {
    u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
}
fn read_u64(buf: &[u8]) -> u64 {
    u64::from_le_bytes([buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;

    fn make_event(raw: &str, value: f64) -> Event {
        Event::new(
            NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap(),
            value,
        )
    }

    #[test]
    fn test_roundtrip_empty() {
        let store = MemoryEventStore::new();
        let mut buf = Vec::new();
        EventFileWriter::write_to(&store, &mut buf).unwrap();
        assert_eq!(&buf[0..4], b"STKB");

        let loaded = EventFileReader::read_from(&mut &buf[..]).unwrap();
        assert_eq!(loaded.count(), 0);
        assert_eq!(loaded.created_at, store.created_at);
    }

    #[test]
    fn test_roundtrip_with_events() {
        let mut store = MemoryEventStore::new();
        store.insert(make_event("2022-09-01T00:00:00", 195028.0));
        store.insert(make_event("2022-09-01T01:15:00", 0.25));

        let mut buf = Vec::new();
        EventFileWriter::write_to(&store, &mut buf).unwrap();

        let loaded = EventFileReader::read_from(&mut &buf[..]).unwrap();
        assert_eq!(loaded.events, store.events);
    }

    #[test]
    fn test_invalid_magic() {
        let buf = [0u8; HEADER_SIZE + 10];
        let err = EventFileReader::read_from(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, SeriesError::Storage(ref m) if m.contains("Invalid magic")));
    }

    #[test]
    fn test_truncated_payload() {
        let mut store = MemoryEventStore::new();
        store.insert(make_event("2022-09-01T00:00:00", 1.0));
        let mut buf = Vec::new();
        EventFileWriter::write_to(&store, &mut buf).unwrap();
        buf.truncate(buf.len() - 3);

        let err = EventFileReader::read_from(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, SeriesError::Storage(ref m) if m.contains("Truncated payload")));
    }

    #[test]
    fn test_oversized_payload_length() {
        let mut buf = Vec::new();
        EventFileWriter::write_to(&MemoryEventStore::new(), &mut buf).unwrap();
        buf[32..40].copy_from_slice(&u64::MAX.to_le_bytes());

        let err = EventFileReader::read_from(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, SeriesError::Storage(ref m) if m.contains("Truncated payload")));
    }

    #[test]
    fn test_short_header_is_io_error() {
        let buf = [0u8; HEADER_SIZE - 1];
        let err = EventFileReader::read_from(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, SeriesError::Io(_)));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.bkts");

        let mut store = MemoryEventStore::new();
        store.insert(make_event("2022-10-05T12:00:00", 7.0));

        EventFileWriter::write_to_file(&store, &path).unwrap();
        let loaded = EventFileReader::read_from_file(&path).unwrap();
        assert_eq!(loaded.count(), 1);
    }
}
