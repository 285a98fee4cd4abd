//! In-memory store, used by tests and as a scratch backend.

use std::sync::Mutex;

use rand::seq::SliceRandom;

use crate::model::{FacePairRecord, MonitoringRecord, PairConditions};
use crate::traits::{FaceStore, MonitoringStore};

/// Keeps faces and monitoring records in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    faces: Mutex<Vec<FacePairRecord>>,
    monitoring: Mutex<Vec<MonitoringRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `faces`.
    pub fn with_faces(faces: Vec<FacePairRecord>) -> Self {
        Self {
            faces: Mutex::new(faces),
            monitoring: Mutex::new(Vec::new()),
        }
    }

    pub fn face_count(&self) -> usize {
        self.count_faces().unwrap_or(0)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> anyhow::Error {
    anyhow::anyhow!("memory store lock poisoned")
}

impl FaceStore for MemoryStore {
    fn save_face(&self, record: &FacePairRecord) -> anyhow::Result<()> {
        let mut faces = self.faces.lock().map_err(poisoned)?;
        if faces.iter().any(|f| f.id == record.id) {
            anyhow::bail!("face {} already exists", record.id);
        }
        faces.push(record.clone());
        Ok(())
    }

    fn face_by_id(&self, id: &str) -> anyhow::Result<Option<FacePairRecord>> {
        let faces = self.faces.lock().map_err(poisoned)?;
        Ok(faces.iter().find(|f| f.id == id).cloned())
    }

    fn random_faces(&self, conditions: &PairConditions, limit: usize) -> anyhow::Result<Vec<FacePairRecord>> {
        let faces = self.faces.lock().map_err(poisoned)?;
        let mut matching: Vec<FacePairRecord> = faces
            .iter()
            .filter(|f| conditions.matches(f))
            .cloned()
            .collect();
        matching.shuffle(&mut rand::thread_rng());
        matching.truncate(limit);
        Ok(matching)
    }

    fn count_faces(&self) -> anyhow::Result<usize> {
        Ok(self.faces.lock().map_err(poisoned)?.len())
    }
}

impl MonitoringStore for MemoryStore {
    fn save_monitoring(&self, record: &MonitoringRecord) -> anyhow::Result<()> {
        self.monitoring.lock().map_err(poisoned)?.push(record.clone());
        Ok(())
    }

    fn recent_monitoring(&self, limit: usize) -> anyhow::Result<Vec<MonitoringRecord>> {
        let monitoring = self.monitoring.lock().map_err(poisoned)?;
        Ok(monitoring.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Age, Gender};
    use chrono::Utc;

    fn face(id: &str, age: u32, gender: Gender) -> FacePairRecord {
        FacePairRecord {
            id: id.into(),
            image_uri: format!("assets/faces/{id}.jpeg"),
            age: Age::new(age).unwrap(),
            gender,
            family_name: "佐藤".into(),
            given_name: "花子".into(),
            ethnicity: "japanese".into(),
            seed: Some(1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn filters_and_limits() {
        let store = MemoryStore::with_faces(vec![
            face("a", 30, Gender::Female),
            face("b", 30, Gender::Male),
            face("c", 30, Gender::Female),
            face("d", 50, Gender::Female),
        ]);
        let conditions = PairConditions {
            age: Some(Age::new(30).unwrap()),
            gender: Some(Gender::Female),
        };
        let found = store.random_faces(&conditions, 10).unwrap();
        let mut ids: Vec<_> = found.iter().map(|f| f.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, ["a", "c"]);

        assert_eq!(store.random_faces(&PairConditions::any(), 3).unwrap().len(), 3);
    }

    #[test]
    fn duplicate_id_rejected() {
        let store = MemoryStore::new();
        store.save_face(&face("a", 20, Gender::Male)).unwrap();
        assert!(store.save_face(&face("a", 20, Gender::Male)).is_err());
        assert_eq!(store.face_count(), 1);
        assert!(store.face_by_id("a").unwrap().is_some());
        assert!(store.face_by_id("zzz").unwrap().is_none());
    }
}
