//! Face image generation: prompt, seed, retried request, payload extraction,
//! decode and file write.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info};

use crate::error::{Result, TrainerError};
use crate::extract::{decode_payload, extract_payload, DEFAULT_MAX_DEPTH};
use crate::model::{Age, Distributions, Gender, ImageMetadata, RequestParams, DEFAULT_ETHNICITY, MAX_SEED};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::traits::{ImageBackend, ImageRequest};

/// Exclusive upper bound of the random file id (ten decimal digits).
const FILE_ID_BOUND: u64 = 10_000_000_000;

/// Settings for [`FaceImageClient`].
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub width: u32,
    pub height: u32,
    pub cfg_scale: f64,
    pub ethnicity: String,
    pub retry: RetryPolicy,
    /// Nesting limit for the recursive payload searches.
    pub max_depth: usize,
    /// Application root; `image_uri` values are relative to it.
    pub app_root: PathBuf,
    /// Image directory, relative to `app_root`.
    pub faces_dir: String,
    pub distributions: Distributions,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            cfg_scale: 7.5,
            ethnicity: DEFAULT_ETHNICITY.to_string(),
            retry: RetryPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            app_root: PathBuf::from("."),
            faces_dir: "assets/faces".to_string(),
            distributions: Distributions::default(),
        }
    }
}

/// A generated image that has been written to disk.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub image_bytes: Vec<u8>,
    pub metadata: ImageMetadata,
    /// Wall-clock time from entry to return.
    pub response_time_ms: u64,
}

/// Prompt text for one face.
pub fn build_prompt(age: Age, gender: Gender, ethnicity: &str) -> String {
    format!("{age}-year-old {gender} {ethnicity} wearing a suit, photorealistic")
}

/// File name for a saved face image.
pub fn face_filename(age: Age, gender: Gender, file_id: u64) -> String {
    format!("{age}-{gender}-{file_id:010}-face.jpeg")
}

/// Generates face images through an [`ImageBackend`] and stores them on disk.
pub struct FaceImageClient {
    backend: Arc<dyn ImageBackend>,
    config: GeneratorConfig,
}

impl FaceImageClient {
    pub fn new(backend: Arc<dyn ImageBackend>, config: GeneratorConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate one face image for `params` and save it under the faces directory.
    pub async fn generate_face_image(&self, params: &RequestParams) -> Result<GeneratedImage> {
        let start = Instant::now();

        if let Some(seed) = params.seed {
            if seed >= MAX_SEED {
                return Err(TrainerError::InvalidParameter(format!(
                    "seed {seed} is outside 0..{MAX_SEED}"
                )));
            }
        }

        // The rng is dropped before the first await.
        let (age, gender, seed, file_id) = {
            let mut rng = rand::thread_rng();
            let (age, gender) = self
                .config
                .distributions
                .resolve(params.age, params.gender, &mut rng);
            let seed = params.seed.unwrap_or_else(|| rng.gen_range(0..MAX_SEED));
            (age, gender, seed, rng.gen_range(0..FILE_ID_BOUND))
        };

        let prompt = build_prompt(age, gender, &self.config.ethnicity);
        let request = ImageRequest::new(
            prompt,
            seed,
            self.config.width,
            self.config.height,
            self.config.cfg_scale,
        );
        info!(backend = self.backend.name(), %age, %gender, seed, "requesting face image");

        let backend = &self.backend;
        let request = &request;
        let body = retry_with_backoff(&self.config.retry, move |_attempt| {
            backend.request_image(request)
        })
        .await?;

        let payload = extract_payload(&body, self.config.max_depth).ok_or(TrainerError::NoImageData)?;
        debug!(strategy = ?payload.strategy, len = payload.data.len(), "located image payload");
        let image_bytes = decode_payload(&payload.data)?;

        let filename = face_filename(age, gender, file_id);
        let dir = self.config.app_root.join(&self.config.faces_dir);
        std::fs::create_dir_all(&dir).map_err(|e| {
            TrainerError::StorageWriteError(format!("creating {}: {e}", dir.display()))
        })?;
        let path = dir.join(&filename);
        std::fs::write(&path, &image_bytes).map_err(|e| {
            TrainerError::StorageWriteError(format!("writing {}: {e}", path.display()))
        })?;

        let metadata = ImageMetadata {
            id: format!("img_{}", uuid::Uuid::new_v4().simple()),
            image_uri: format!("{}/{filename}", self.config.faces_dir.trim_end_matches('/')),
            filename,
            age,
            gender,
            ethnicity: self.config.ethnicity.clone(),
            seed,
            finish_reason: payload.finish_reason,
            created_at: Utc::now(),
        };
        let response_time_ms = start.elapsed().as_millis() as u64;
        info!(id = %metadata.id, uri = %metadata.image_uri, response_time_ms, "saved face image");

        Ok(GeneratedImage {
            image_bytes,
            metadata,
            response_time_ms,
        })
    }
}
