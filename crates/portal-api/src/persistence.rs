use std::fmt;
use std::path::Path;

use contracts::{ProgressionRecord, SCHEMA_VERSION_V1, STATS_RECORD_KEY};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

#[derive(Debug)]
pub enum PersistenceError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Serde(err) => write!(f, "serde error: {err}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Single-record store for the agent's career stats. Reads never fail on a
/// corrupt payload; writes are write-through after every scoring mutation.
#[derive(Debug)]
pub struct SqliteStatsStore {
    conn: Connection,
}

impl SqliteStatsStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    /// Absent or malformed record decodes to all-zero defaults; individual
    /// bad fields fall back independently.
    pub fn load_record(&self) -> Result<ProgressionRecord, PersistenceError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload_json FROM stats WHERE record_key = ?1",
                params![STATS_RECORD_KEY],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = payload else {
            return Ok(ProgressionRecord::default());
        };

        let record = match serde_json::from_str::<Value>(&raw) {
            Ok(value) => ProgressionRecord::from_value(&value),
            Err(_) => ProgressionRecord::default(),
        };

        Ok(record)
    }

    pub fn save_record(&self, record: &ProgressionRecord) -> Result<(), PersistenceError> {
        let payload_json = serde_json::to_string(record)?;

        self.conn.execute(
            "INSERT INTO stats (record_key, schema_version, payload_json, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(record_key) DO UPDATE SET
                schema_version = excluded.schema_version,
                payload_json = excluded.payload_json,
                updated_at = excluded.updated_at",
            params![STATS_RECORD_KEY, SCHEMA_VERSION_V1, payload_json],
        )?;

        Ok(())
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS stats (
                record_key TEXT PRIMARY KEY,
                schema_version TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_migrations(version, name, applied_at)
             VALUES(1, 'initial_v1', datetime('now'))",
            [],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();

        std::env::temp_dir().join(format!("portal_stats_{name}_{nanos}.sqlite"))
    }

    fn cleanup(path: &std::path::Path) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("sqlite-wal"));
        let _ = std::fs::remove_file(path.with_extension("sqlite-shm"));
    }

    #[test]
    fn load_without_record_yields_defaults() {
        let path = temp_db_path("defaults");
        let store = SqliteStatsStore::open(&path).expect("open store");

        let record = store.load_record().expect("load");
        assert_eq!(record, ProgressionRecord::default());

        cleanup(&path);
    }

    #[test]
    fn save_then_load_round_trips_field_for_field() {
        let path = temp_db_path("round_trip");
        let store = SqliteStatsStore::open(&path).expect("open store");

        let mut record = ProgressionRecord {
            rank_index: 3,
            accepted: 9,
            rejected: 2,
            need_more: 4,
            ..ProgressionRecord::default()
        };
        record.recompute();

        store.save_record(&record).expect("save");
        let loaded = store.load_record().expect("load");
        assert_eq!(loaded, record);

        cleanup(&path);
    }

    #[test]
    fn second_save_overwrites_the_single_record() {
        let path = temp_db_path("overwrite");
        let store = SqliteStatsStore::open(&path).expect("open store");

        let mut first = ProgressionRecord::default();
        first.accepted = 1;
        first.recompute();
        store.save_record(&first).expect("save first");

        let mut second = first.clone();
        second.accepted = 2;
        second.recompute();
        store.save_record(&second).expect("save second");

        assert_eq!(store.load_record().expect("load"), second);

        cleanup(&path);
    }

    #[test]
    fn corrupt_payload_falls_back_to_defaults() {
        let path = temp_db_path("corrupt");
        let store = SqliteStatsStore::open(&path).expect("open store");

        store
            .conn
            .execute(
                "INSERT INTO stats (record_key, schema_version, payload_json, updated_at)
                 VALUES (?1, ?2, 'not json at all', datetime('now'))",
                params![STATS_RECORD_KEY, SCHEMA_VERSION_V1],
            )
            .expect("insert corrupt row");

        let record = store.load_record().expect("load");
        assert_eq!(record, ProgressionRecord::default());

        cleanup(&path);
    }

    #[test]
    fn partially_corrupt_payload_keeps_the_good_fields() {
        let path = temp_db_path("partial");
        let store = SqliteStatsStore::open(&path).expect("open store");

        store
            .conn
            .execute(
                "INSERT INTO stats (record_key, schema_version, payload_json, updated_at)
                 VALUES (?1, ?2, ?3, datetime('now'))",
                params![
                    STATS_RECORD_KEY,
                    SCHEMA_VERSION_V1,
                    r#"{"rankIndex":2,"accepted":"bad","rejected":5}"#
                ],
            )
            .expect("insert partial row");

        let record = store.load_record().expect("load");
        assert_eq!(record.rank_index, 2);
        assert_eq!(record.accepted, 0);
        assert_eq!(record.rejected, 5);

        cleanup(&path);
    }
}
