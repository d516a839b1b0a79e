//! SQLite-backed transcript cache.
//!
//! One row per video in `video_transcripts`. Rows are inserted once and only
//! their hit counters change afterwards.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::model::{TranscriptLine, TranscriptRecord};

/// Record store consulted by the orchestrator.
pub trait TranscriptStore: Send + Sync {
    fn find(&self, video_id: &str) -> Result<Option<TranscriptRecord>, StoreError>;

    /// Increment `fetch_count` and set `last_fetched` in one statement.
    /// Returns the new `fetch_count`.
    fn record_hit(&self, video_id: &str, at: DateTime<Utc>) -> Result<i64, StoreError>;

    /// Insert a new record. Returns `false` if one already exists for the
    /// video id, in which case the stored row is left untouched.
    fn insert(&self, record: &TranscriptRecord) -> Result<bool, StoreError>;
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS video_transcripts (
        video_id TEXT PRIMARY KEY,
        transcript TEXT NOT NULL,
        title TEXT NOT NULL,
        channel_id TEXT NOT NULL,
        channel_title TEXT NOT NULL,
        published_at TEXT NOT NULL,
        language TEXT NOT NULL,
        is_generated INTEGER NOT NULL,
        duration INTEGER NOT NULL,
        fetch_count INTEGER NOT NULL DEFAULT 1,
        last_fetched TEXT NOT NULL,
        processing_status TEXT NOT NULL
    );
"#;

const SELECT_RECORD: &str = "SELECT video_id, transcript, title, channel_id, channel_title, \
     published_at, language, is_generated, duration, fetch_count, last_fetched, \
     processing_status FROM video_transcripts WHERE video_id = ?1";

/// Aggregate numbers for the `status` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub records: i64,
    pub total_fetches: i64,
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.lock()?;
        let stats = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(fetch_count), 0) FROM video_transcripts",
            [],
            |row| {
                Ok(StoreStats {
                    records: row.get(0)?,
                    total_fetches: row.get(1)?,
                })
            },
        )?;
        Ok(stats)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl TranscriptStore for SqliteStore {
    fn find(&self, video_id: &str) -> Result<Option<TranscriptRecord>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(SELECT_RECORD, params![video_id], |row| {
                Ok(StoredRow {
                    video_id: row.get(0)?,
                    transcript: row.get(1)?,
                    title: row.get(2)?,
                    channel_id: row.get(3)?,
                    channel_title: row.get(4)?,
                    published_at: row.get(5)?,
                    language: row.get(6)?,
                    is_generated: row.get(7)?,
                    duration: row.get(8)?,
                    fetch_count: row.get(9)?,
                    last_fetched: row.get(10)?,
                    processing_status: row.get(11)?,
                })
            })
            .optional()?;

        row.map(StoredRow::into_record).transpose()
    }

    fn record_hit(&self, video_id: &str, at: DateTime<Utc>) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        let count: Option<i64> = conn
            .query_row(
                "UPDATE video_transcripts \
                 SET fetch_count = fetch_count + 1, last_fetched = ?2 \
                 WHERE video_id = ?1 RETURNING fetch_count",
                params![video_id, at.to_rfc3339()],
                |row| row.get(0),
            )
            .optional()?;

        count.ok_or_else(|| StoreError::Missing(video_id.to_string()))
    }

    fn insert(&self, record: &TranscriptRecord) -> Result<bool, StoreError> {
        let transcript = serde_json::to_string(&record.transcript)?;
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT INTO video_transcripts (video_id, transcript, title, channel_id, \
             channel_title, published_at, language, is_generated, duration, fetch_count, \
             last_fetched, processing_status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
             ON CONFLICT(video_id) DO NOTHING",
            params![
                record.video_id,
                transcript,
                record.title,
                record.channel_id,
                record.channel_title,
                record.published_at,
                record.language,
                record.is_generated,
                record.duration,
                record.fetch_count,
                record.last_fetched.to_rfc3339(),
                record.processing_status,
            ],
        )?;
        Ok(inserted == 1)
    }
}

struct StoredRow {
    video_id: String,
    transcript: String,
    title: String,
    channel_id: String,
    channel_title: String,
    published_at: String,
    language: String,
    is_generated: bool,
    duration: i64,
    fetch_count: i64,
    last_fetched: String,
    processing_status: String,
}

impl StoredRow {
    fn into_record(self) -> Result<TranscriptRecord, StoreError> {
        let transcript: Vec<TranscriptLine> = serde_json::from_str(&self.transcript)?;
        let last_fetched = DateTime::parse_from_rfc3339(&self.last_fetched)
            .map_err(|e| {
                StoreError::Corrupt(format!(
                    "last_fetched {:?} for {}: {}",
                    self.last_fetched, self.video_id, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(TranscriptRecord {
            video_id: self.video_id,
            transcript,
            title: self.title,
            channel_id: self.channel_id,
            channel_title: self.channel_title,
            published_at: self.published_at,
            language: self.language,
            is_generated: self.is_generated,
            duration: self.duration,
            fetch_count: self.fetch_count,
            last_fetched,
            processing_status: self.processing_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::STATUS_COMPLETED;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn make_record(video_id: &str) -> TranscriptRecord {
        TranscriptRecord {
            video_id: video_id.to_string(),
            transcript: vec![
                TranscriptLine {
                    text: "first".to_string(),
                    start: 0.0,
                    duration: 1.5,
                },
                TranscriptLine {
                    text: "second".to_string(),
                    start: 1.5,
                    duration: 2.25,
                },
            ],
            title: "A video".to_string(),
            channel_id: "UC123".to_string(),
            channel_title: "Channel".to_string(),
            published_at: "2024-01-02T03:04:05Z".to_string(),
            language: "en".to_string(),
            is_generated: true,
            duration: 90,
            fetch_count: 1,
            last_fetched: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            processing_status: STATUS_COMPLETED.to_string(),
        }
    }

    #[test]
    fn test_find_missing_returns_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.find("nope").unwrap().is_none());
    }

    #[test]
    fn test_insert_then_find() {
        let store = SqliteStore::open_in_memory().unwrap();
        let record = make_record("abc");
        assert!(store.insert(&record).unwrap());

        let loaded = store.find("abc").unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_second_insert_is_ignored() {
        let store = SqliteStore::open_in_memory().unwrap();
        let original = make_record("abc");
        assert!(store.insert(&original).unwrap());

        let mut other = make_record("abc");
        other.title = "Overwritten?".to_string();
        other.transcript.clear();
        assert!(!store.insert(&other).unwrap());

        let loaded = store.find("abc").unwrap().unwrap();
        assert_eq!(loaded.title, "A video");
        assert_eq!(loaded.transcript.len(), 2);
    }

    #[test]
    fn test_record_hit_increments_and_touches() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&make_record("abc")).unwrap();

        let later = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
        assert_eq!(store.record_hit("abc", later).unwrap(), 2);
        assert_eq!(store.record_hit("abc", later).unwrap(), 3);

        let loaded = store.find("abc").unwrap().unwrap();
        assert_eq!(loaded.fetch_count, 3);
        assert_eq!(loaded.last_fetched, later);
        assert_eq!(loaded.transcript, make_record("abc").transcript);
    }

    #[test]
    fn test_record_hit_on_missing_record_errors() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store.record_hit("ghost", Utc::now());
        assert!(matches!(result, Err(StoreError::Missing(id)) if id == "ghost"));
    }

    #[test]
    fn test_open_creates_parent_dirs_and_persists() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("nested").join("cache.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.insert(&make_record("persisted")).unwrap();
            assert_eq!(store.path(), Some(db_path.as_path()));
        }

        let reopened = SqliteStore::open(&db_path).unwrap();
        assert!(reopened.find("persisted").unwrap().is_some());
    }

    #[test]
    fn test_stats_counts_records_and_fetches() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.stats().unwrap(), StoreStats::default());

        store.insert(&make_record("a")).unwrap();
        store.insert(&make_record("b")).unwrap();
        store.record_hit("a", Utc::now()).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.records, 2);
        assert_eq!(stats.total_fetches, 3);
    }

    #[test]
    fn test_corrupt_timestamp_is_reported() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&make_record("abc")).unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "UPDATE video_transcripts SET last_fetched = 'yesterday' WHERE video_id = 'abc'",
                [],
            )
            .unwrap();

        let err = store.find("abc").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
