//! Persistent seen-record set
//!
//! The seen set is append-only: a fingerprint is inserted on first
//! observation and never removed by the pipeline (eviction is an operator
//! decision, made outside this process). The full record is stored next to
//! each fingerprint so duplicates can be inspected after the fact.
//!
//! One store, one writer: concurrent runs against the same file are not
//! supported and must be serialized by the caller.

use super::types::ActivityRecord;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Capability the duplicate filter works against.
///
/// Backed by SQLite in production; tests inject [`MemorySeenStore`] so the
/// pipeline never touches the filesystem.
pub trait SeenStore {
    /// Whether this fingerprint has been observed in any previous run.
    fn contains(&self, fingerprint: &str) -> Result<bool, Box<dyn std::error::Error>>;

    /// Record a first observation. Inserting an existing fingerprint is a
    /// no-op (the first observation wins).
    fn insert(
        &mut self,
        fingerprint: &str,
        record: &ActivityRecord,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Make everything inserted so far durable.
    fn flush(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}

/// SQLite-backed seen store
pub struct SqliteSeenStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSeenStore {
    /// Open (or create) the store at `db_path`.
    ///
    /// The schema is created idempotently, so pointing at a fresh path
    /// just works.
    pub fn open(db_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS seen_records (
                fingerprint     TEXT PRIMARY KEY,
                record          TEXT NOT NULL,
                first_seen      INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Number of fingerprints on record.
    pub fn len(&self) -> Result<usize, Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM seen_records", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, Box<dyn std::error::Error>> {
        Ok(self.len()? == 0)
    }
}

impl SeenStore for SqliteSeenStore {
    fn contains(&self, fingerprint: &str) -> Result<bool, Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare_cached("SELECT fingerprint FROM seen_records WHERE fingerprint = ?")?;
        let found = stmt.exists(rusqlite::params![fingerprint])?;
        Ok(found)
    }

    fn insert(
        &mut self,
        fingerprint: &str,
        record: &ActivityRecord,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let record_json = serde_json::to_string(record)?;
        let now = chrono::Utc::now().timestamp();

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "INSERT OR IGNORE INTO seen_records (fingerprint, record, first_seen)
             VALUES (?, ?, ?)",
        )?;
        stmt.execute(rusqlite::params![fingerprint, record_json, now])?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        // wal_checkpoint returns a status row, so query instead of execute
        conn.query_row("PRAGMA wal_checkpoint(FULL)", [], |_| Ok(()))?;
        Ok(())
    }
}

/// In-memory seen store for tests
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    records: std::collections::BTreeMap<String, String>,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SeenStore for MemorySeenStore {
    fn contains(&self, fingerprint: &str) -> Result<bool, Box<dyn std::error::Error>> {
        Ok(self.records.contains_key(fingerprint))
    }

    fn insert(
        &mut self,
        fingerprint: &str,
        record: &ActivityRecord,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.records
            .entry(fingerprint.to_string())
            .or_insert(serde_json::to_string(record)?);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::ActivitySource;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use tempfile::NamedTempFile;

    fn make_record(key: &str) -> ActivityRecord {
        ActivityRecord {
            source: ActivitySource::Git,
            key: key.to_string(),
            end_date: Utc.with_ymd_and_hms(2013, 5, 16, 15, 52, 52).unwrap(),
            seconds: 500,
            notes: vec!["foo".to_string()],
            project: None,
            extras: BTreeMap::new(),
        }
    }

    #[test]
    fn test_sqlite_insert_then_contains() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut store = SqliteSeenStore::open(temp_file.path().to_str().unwrap()).unwrap();

        let record = make_record("bar-foo");
        let fp = record.fingerprint();

        assert!(!store.contains(&fp).unwrap());
        store.insert(&fp, &record).unwrap();
        assert!(store.contains(&fp).unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_sqlite_reinsert_is_noop() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut store = SqliteSeenStore::open(temp_file.path().to_str().unwrap()).unwrap();

        let record = make_record("bar-foo");
        let fp = record.fingerprint();

        store.insert(&fp, &record).unwrap();
        store.insert(&fp, &record).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_sqlite_survives_reopen() {
        // The seen set persists between invocations
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();

        let record = make_record("bar-foo");
        let fp = record.fingerprint();

        {
            let mut store = SqliteSeenStore::open(&db_path).unwrap();
            store.insert(&fp, &record).unwrap();
            store.flush().unwrap();
        }

        let store = SqliteSeenStore::open(&db_path).unwrap();
        assert!(store.contains(&fp).unwrap());
    }

    #[test]
    fn test_sqlite_stores_record_for_inspection() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut store = SqliteSeenStore::open(temp_file.path().to_str().unwrap()).unwrap();

        let record = make_record("bar-foo");
        store.insert(&record.fingerprint(), &record).unwrap();

        let conn = store.conn.lock().unwrap();
        let stored: String = conn
            .query_row("SELECT record FROM seen_records", [], |row| row.get(0))
            .unwrap();
        let parsed: ActivityRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemorySeenStore::new();
        let record = make_record("bar-foo");
        let fp = record.fingerprint();

        assert!(store.is_empty());
        store.insert(&fp, &record).unwrap();
        assert!(store.contains(&fp).unwrap());
        assert!(!store.contains("something-else").unwrap());
        assert_eq!(store.len(), 1);
    }
}
