//! Core trait definitions for image backends and stores.
//!
//! The image backend is implemented by `facename-providers`; the stores by
//! `facename-store` (plus the in-memory store in [`crate::store`]).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::model::{FacePairRecord, MonitoringRecord, PairConditions};

// ---------------------------------------------------------------------------
// Image backend trait
// ---------------------------------------------------------------------------

/// A text-to-image service. Each call to [`ImageBackend::request_image`] is
/// exactly one attempt; retries are the caller's business.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Human-readable backend name (e.g. "stability").
    fn name(&self) -> &str;

    /// Issue one generation request and return the decoded JSON body.
    async fn request_image(&self, request: &ImageRequest)
        -> Result<serde_json::Value, ProviderError>;
}

/// Body of a generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub width: u32,
    pub height: u32,
    pub seed: u32,
    pub cfg_scale: f64,
    pub samples: u32,
    pub prompt: String,
    pub text_prompts: Vec<TextPrompt>,
}

/// Weighted prompt entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPrompt {
    pub text: String,
    pub weight: f64,
}

impl ImageRequest {
    /// Build a single-sample request whose weighted prompt mirrors `prompt`.
    pub fn new(prompt: String, seed: u32, width: u32, height: u32, cfg_scale: f64) -> Self {
        Self {
            width,
            height,
            seed,
            cfg_scale,
            samples: 1,
            text_prompts: vec![TextPrompt {
                text: prompt.clone(),
                weight: 1.0,
            }],
            prompt,
        }
    }
}

// ---------------------------------------------------------------------------
// Store traits
// ---------------------------------------------------------------------------

/// Durable storage for face-name pairs.
pub trait FaceStore: Send + Sync {
    /// Insert a new record. Records are never updated afterwards.
    fn save_face(&self, record: &FacePairRecord) -> anyhow::Result<()>;

    /// Look up a record by id.
    fn face_by_id(&self, id: &str) -> anyhow::Result<Option<FacePairRecord>>;

    /// Up to `limit` records matching `conditions`, in uniformly random order.
    fn random_faces(
        &self,
        conditions: &PairConditions,
        limit: usize,
    ) -> anyhow::Result<Vec<FacePairRecord>>;

    /// Number of stored records.
    fn count_faces(&self) -> anyhow::Result<usize>;
}

/// Storage for generation monitoring records.
pub trait MonitoringStore: Send + Sync {
    fn save_monitoring(&self, record: &MonitoringRecord) -> anyhow::Result<()>;

    /// Most recent records, newest first.
    fn recent_monitoring(&self, limit: usize) -> anyhow::Result<Vec<MonitoringRecord>>;
}
