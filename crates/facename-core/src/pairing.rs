//! Pairing service: generated image + generated name = persisted face pair.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Result, TrainerError};
use crate::generator::{FaceImageClient, GeneratedImage};
use crate::model::{Age, FacePairRecord, Gender, PairConditions, RequestParams};
use crate::monitor::GenerationMonitor;
use crate::names::NameGenerator;
use crate::traits::FaceStore;

/// Produces face-name pairs, reusing stored ones where possible.
pub struct PairingService {
    images: FaceImageClient,
    names: NameGenerator,
    monitor: GenerationMonitor,
    store: Arc<dyn FaceStore>,
}

impl PairingService {
    pub fn new(
        images: FaceImageClient,
        names: NameGenerator,
        monitor: GenerationMonitor,
        store: Arc<dyn FaceStore>,
    ) -> Self {
        Self {
            images,
            names,
            monitor,
            store,
        }
    }

    pub fn images(&self) -> &FaceImageClient {
        &self.images
    }

    pub fn monitor(&self) -> &GenerationMonitor {
        &self.monitor
    }

    /// Generate, name and persist one new pair.
    pub async fn generate_pair(&self, age: Option<Age>, gender: Option<Gender>) -> Result<FacePairRecord> {
        let params = RequestParams {
            age,
            gender,
            seed: None,
        };
        let monitored = self
            .monitor
            .monitor(params, |p| async move { self.images.generate_face_image(&p).await })
            .await?;
        self.pair_from_image(monitored.value)
    }

    /// Name an already generated image and persist the pair.
    ///
    /// The name is drawn for the buckets the image was actually generated
    /// with, which may differ from what was requested.
    pub fn pair_from_image(&self, image: GeneratedImage) -> Result<FacePairRecord> {
        let meta = image.metadata;
        let name = self.names.generate_name(meta.age, meta.gender)?;
        let record = FacePairRecord {
            id: meta.id,
            image_uri: meta.image_uri,
            age: meta.age,
            gender: meta.gender,
            family_name: name.family_name,
            given_name: name.given_name,
            ethnicity: meta.ethnicity,
            seed: Some(meta.seed),
            created_at: meta.created_at,
        };
        self.store
            .save_face(&record)
            .map_err(|e| TrainerError::StorageWriteError(format!("{e:#}")))?;
        info!(id = %record.id, name = %record.full_name(), "saved face pair");
        Ok(record)
    }

    /// Generate `count` pairs one after another. The first failure aborts.
    pub async fn generate_multiple(&self, count: usize, conditions: PairConditions) -> Result<Vec<FacePairRecord>> {
        let mut pairs = Vec::new();
        for _ in 0..count {
            pairs.push(self.generate_pair(conditions.age, conditions.gender).await?);
        }
        Ok(pairs)
    }

    /// Up to `count` stored pairs matching `conditions` in random order, topped
    /// up with freshly generated ones when the store runs short.
    pub async fn get_random_pairs(&self, count: usize, conditions: PairConditions) -> Result<Vec<FacePairRecord>> {
        let mut pairs = self
            .store
            .random_faces(&conditions, count)
            .map_err(|e| TrainerError::StorageReadError(format!("{e:#}")))?;
        let shortfall = count.saturating_sub(pairs.len());
        debug!(found = pairs.len(), shortfall, "looked up stored pairs");
        if shortfall > 0 {
            pairs.extend(self.generate_multiple(shortfall, conditions).await?);
        }
        Ok(pairs)
    }

    pub fn get_pair_by_id(&self, id: &str) -> Result<Option<FacePairRecord>> {
        self.store
            .face_by_id(id)
            .map_err(|e| TrainerError::StorageReadError(format!("{e:#}")))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::traits::MonitoringStore;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn generated_pair_is_persisted() {
        let fx = fixture_with(Vec::new());
        let pair = fx
            .service
            .generate_pair(Some(Age::new(30).unwrap()), Some(Gender::Female))
            .await
            .unwrap();

        assert_eq!(pair.age.years(), 30);
        assert_eq!(pair.gender, Gender::Female);
        assert_eq!(pair.ethnicity, "japanese");
        assert_eq!(pair.full_name(), "山田 太郎");
        assert_eq!(fx.service.get_pair_by_id(&pair.id).unwrap(), Some(pair.clone()));
        assert_eq!(std::fs::read(fx.root.path().join(&pair.image_uri)).unwrap(), stub_bytes());
        assert_eq!(fx.store.recent_monitoring(10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn shortfall_is_generated_with_same_conditions() {
        let fx = fixture_with(vec![
            stored_face("s1", 30, Gender::Male),
            stored_face("s2", 30, Gender::Female),
            stored_face("s3", 50, Gender::Female),
        ]);
        let conditions = PairConditions {
            age: Some(Age::new(30).unwrap()),
            gender: None,
        };

        let pairs = fx.service.get_random_pairs(5, conditions).await.unwrap();
        assert_eq!(pairs.len(), 5);

        let mut stored: Vec<_> = pairs[..2].iter().map(|p| p.id.as_str()).collect();
        stored.sort();
        assert_eq!(stored, ["s1", "s2"]);
        for generated in &pairs[2..] {
            assert_eq!(generated.age.years(), 30);
            assert!(generated.id.starts_with("img_"));
        }
        assert_eq!(fx.backend.calls.load(Ordering::SeqCst), 3);
        assert_eq!(fx.store.face_count(), 6);
    }

    #[tokio::test]
    async fn enough_stored_pairs_means_no_generation() {
        let fx = fixture_with(vec![
            stored_face("s1", 20, Gender::Male),
            stored_face("s2", 40, Gender::Female),
        ]);
        let pairs = fx.service.get_random_pairs(2, PairConditions::any()).await.unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(fx.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shortfall_errors_propagate() {
        let fx = fixture_with(vec![stored_face("s1", 20, Gender::Male)]);
        fx.backend.failing.store(true, Ordering::SeqCst);

        let err = fx
            .service
            .get_random_pairs(3, PairConditions::any())
            .await
            .unwrap_err();
        assert!(matches!(err, TrainerError::UpstreamExhausted { .. }));
        // generate_multiple stops at the first failing pair.
        assert_eq!(fx.backend.calls.load(Ordering::SeqCst), 3);
        let records = fx.store.recent_monitoring(10).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].performance.success);
    }

    #[tokio::test]
    async fn missing_id() {
        let fx = fixture_with(Vec::new());
        assert_eq!(fx.service.get_pair_by_id("img_missing").unwrap(), None);
    }
}
