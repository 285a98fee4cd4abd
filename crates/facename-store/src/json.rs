//! JSON document store.
//!
//! Faces live in `faces.json`, monitoring records in `monitoring.json`, both
//! inside one data directory. Only the last [`MAX_MONITORING_RECORDS`]
//! monitoring records are kept.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use facename_core::model::{FacePairRecord, MonitoringRecord, PairConditions};
use facename_core::traits::{FaceStore, MonitoringStore};

use crate::error::{Result, StoreError};

pub const FACES_FILE: &str = "faces.json";
pub const MONITORING_FILE: &str = "monitoring.json";
pub const MAX_MONITORING_RECORDS: usize = 100;

/// File-per-collection store under a data directory.
pub struct JsonFileStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles on the documents.
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn faces(&self) -> Result<Vec<FacePairRecord>> {
        read_document(&self.dir.join(FACES_FILE))
    }

    fn insert_face(&self, record: &FacePairRecord) -> Result<()> {
        let _guard = self.lock.lock()?;
        let path = self.dir.join(FACES_FILE);
        let mut faces: Vec<FacePairRecord> = read_document(&path)?;
        if faces.iter().any(|f| f.id == record.id) {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }
        faces.push(record.clone());
        write_document(&path, &faces)
    }

    fn insert_monitoring(&self, record: &MonitoringRecord) -> Result<()> {
        let _guard = self.lock.lock()?;
        let path = self.dir.join(MONITORING_FILE);
        let mut records: Vec<MonitoringRecord> = read_document(&path)?;
        records.push(record.clone());
        let overflow = records.len().saturating_sub(MAX_MONITORING_RECORDS);
        records.drain(..overflow);
        write_document(&path, &records)
    }
}

fn read_document<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&content).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json)?;
    debug!(path = %path.display(), "wrote store document");
    Ok(())
}

impl FaceStore for JsonFileStore {
    fn save_face(&self, record: &FacePairRecord) -> anyhow::Result<()> {
        Ok(self.insert_face(record)?)
    }

    fn face_by_id(&self, id: &str) -> anyhow::Result<Option<FacePairRecord>> {
        let _guard = self.lock.lock().map_err(StoreError::from)?;
        Ok(self.faces()?.into_iter().find(|f| f.id == id))
    }

    fn random_faces(&self, conditions: &PairConditions, limit: usize) -> anyhow::Result<Vec<FacePairRecord>> {
        let _guard = self.lock.lock().map_err(StoreError::from)?;
        let mut matching: Vec<FacePairRecord> = self
            .faces()?
            .into_iter()
            .filter(|f| conditions.matches(f))
            .collect();
        matching.shuffle(&mut rand::thread_rng());
        matching.truncate(limit);
        Ok(matching)
    }

    fn count_faces(&self) -> anyhow::Result<usize> {
        let _guard = self.lock.lock().map_err(StoreError::from)?;
        Ok(self.faces()?.len())
    }
}

impl MonitoringStore for JsonFileStore {
    fn save_monitoring(&self, record: &MonitoringRecord) -> anyhow::Result<()> {
        Ok(self.insert_monitoring(record)?)
    }

    fn recent_monitoring(&self, limit: usize) -> anyhow::Result<Vec<MonitoringRecord>> {
        let _guard = self.lock.lock().map_err(StoreError::from)?;
        let records: Vec<MonitoringRecord> = read_document(&self.dir.join(MONITORING_FILE))?;
        Ok(records.into_iter().rev().take(limit).collect())
    }
}
