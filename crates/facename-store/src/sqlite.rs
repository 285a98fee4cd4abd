//! SQLite-backed store.
//!
//! Faces are kept in typed columns so random lookups can filter on the
//! age/gender buckets. Monitoring records keep their nested sections as JSON
//! text.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use facename_core::model::{Age, FacePairRecord, Gender, MonitoringRecord, PairConditions};
use facename_core::traits::{FaceStore, MonitoringStore};

use crate::error::{Result, StoreError};

const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS faces (
    id TEXT PRIMARY KEY,
    image_uri TEXT NOT NULL,
    age INTEGER NOT NULL,
    gender TEXT NOT NULL,
    family_name TEXT NOT NULL,
    given_name TEXT NOT NULL,
    ethnicity TEXT NOT NULL,
    seed INTEGER,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_faces_bucket ON faces(age, gender);

CREATE TABLE IF NOT EXISTS monitoring_data (
    id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    request_params TEXT NOT NULL,
    performance TEXT NOT NULL,
    quality TEXT,
    errors TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_monitoring_timestamp ON monitoring_data(timestamp);
";

const FACE_COLUMNS: &str =
    "id, image_uri, age, gender, family_name, given_name, ethnicity, seed, created_at";

/// Face and monitoring store in one SQLite database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn insert_face(&self, record: &FacePairRecord) -> Result<()> {
        let conn = self.conn.lock()?;
        let exists: Option<String> = conn
            .query_row("SELECT id FROM faces WHERE id = ?1", params![record.id], |row| row.get(0))
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }
        conn.execute(
            "INSERT INTO faces (id, image_uri, age, gender, family_name, given_name, ethnicity, seed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id,
                record.image_uri,
                record.age.years(),
                record.gender.as_str(),
                record.family_name,
                record.given_name,
                record.ethnicity,
                record.seed,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn select_face(&self, id: &str) -> Result<Option<FacePairRecord>> {
        let conn = self.conn.lock()?;
        let sql = format!("SELECT {FACE_COLUMNS} FROM faces WHERE id = ?1");
        Ok(conn.query_row(&sql, params![id], decode_face_row).optional()?)
    }

    fn select_random(&self, conditions: &PairConditions, limit: usize) -> Result<Vec<FacePairRecord>> {
        let conn = self.conn.lock()?;
        let sql = format!(
            "SELECT {FACE_COLUMNS} FROM faces
             WHERE (?1 IS NULL OR age = ?1) AND (?2 IS NULL OR gender = ?2)
             ORDER BY RANDOM() LIMIT ?3"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                conditions.age.map(Age::years),
                conditions.gender.map(Gender::as_str),
                i64::try_from(limit).unwrap_or(i64::MAX),
            ],
            decode_face_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM faces", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| StoreError::InvalidDbValue(format!("face count {count}")))
    }

    fn insert_monitoring(&self, record: &MonitoringRecord) -> Result<()> {
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT INTO monitoring_data (id, timestamp, request_params, performance, quality, errors)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.timestamp.to_rfc3339(),
                to_json(&record.request_params)?,
                to_json(&record.performance)?,
                record.quality.as_ref().map(to_json).transpose()?,
                record.errors.as_ref().map(to_json).transpose()?,
            ],
        )?;
        Ok(())
    }

    fn select_recent_monitoring(&self, limit: usize) -> Result<Vec<MonitoringRecord>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, request_params, performance, quality, errors
             FROM monitoring_data ORDER BY timestamp DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(
            params![i64::try_from(limit).unwrap_or(i64::MAX)],
            decode_monitoring_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl FaceStore for SqliteStore {
    fn save_face(&self, record: &FacePairRecord) -> anyhow::Result<()> {
        Ok(self.insert_face(record)?)
    }

    fn face_by_id(&self, id: &str) -> anyhow::Result<Option<FacePairRecord>> {
        Ok(self.select_face(id)?)
    }

    fn random_faces(&self, conditions: &PairConditions, limit: usize) -> anyhow::Result<Vec<FacePairRecord>> {
        Ok(self.select_random(conditions, limit)?)
    }

    fn count_faces(&self) -> anyhow::Result<usize> {
        Ok(self.count()?)
    }
}

impl MonitoringStore for SqliteStore {
    fn save_monitoring(&self, record: &MonitoringRecord) -> anyhow::Result<()> {
        Ok(self.insert_monitoring(record)?)
    }

    fn recent_monitoring(&self, limit: usize) -> anyhow::Result<Vec<MonitoringRecord>> {
        Ok(self.select_recent_monitoring(limit)?)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| StoreError::InvalidDbValue(e.to_string()))
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn parse_json<T: serde::de::DeserializeOwned>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw).map_err(|e| conversion_error(idx, e))
}

fn decode_face_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FacePairRecord> {
    let age: u32 = row.get(2)?;
    let gender: String = row.get(3)?;
    let created_at: String = row.get(8)?;
    Ok(FacePairRecord {
        id: row.get(0)?,
        image_uri: row.get(1)?,
        age: Age::new(age).map_err(|e| conversion_error(2, e))?,
        gender: gender.parse().map_err(|e| conversion_error(3, e))?,
        family_name: row.get(4)?,
        given_name: row.get(5)?,
        ethnicity: row.get(6)?,
        seed: row.get(7)?,
        created_at: parse_timestamp(8, &created_at)?,
    })
}

fn decode_monitoring_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MonitoringRecord> {
    let timestamp: String = row.get(1)?;
    let request_params: String = row.get(2)?;
    let performance: String = row.get(3)?;
    let quality: Option<String> = row.get(4)?;
    let errors: Option<String> = row.get(5)?;
    Ok(MonitoringRecord {
        id: row.get(0)?,
        timestamp: parse_timestamp(1, &timestamp)?,
        request_params: parse_json(2, &request_params)?,
        performance: parse_json(3, &performance)?,
        quality: quality.as_deref().map(|q| parse_json(4, q)).transpose()?,
        errors: errors.as_deref().map(|e| parse_json(5, e)).transpose()?,
    })
}
