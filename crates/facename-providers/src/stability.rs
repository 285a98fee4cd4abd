//! Stability AI text-to-image backend.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use facename_core::error::ProviderError;
use facename_core::traits::{ImageBackend, ImageRequest};

pub const DEFAULT_ENDPOINT: &str = "https://api.stability.ai/v2beta/stable-image/generate/core";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Longest error body kept in an `ApiError` message.
const MAX_ERROR_BODY: usize = 500;

/// HTTP backend posting JSON generation requests to a Stability-style endpoint.
pub struct StabilityBackend {
    api_key: String,
    endpoint: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl StabilityBackend {
    pub fn new(api_key: &str, endpoint: Option<String>, timeout_secs: Option<u64>) -> anyhow::Result<Self> {
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            api_key: api_key.to_string(),
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout_secs,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn truncate(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[async_trait]
impl ImageBackend for StabilityBackend {
    fn name(&self) -> &str {
        "stability"
    }

    #[instrument(skip(self, request), fields(seed = request.seed))]
    async fn request_image(&self, request: &ImageRequest) -> Result<serde_json::Value, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout_secs)
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: truncate(body),
            });
        }

        debug!(status = status.as_u16(), bytes = body.len(), "image response received");
        serde_json::from_str(&body).map_err(|e| ProviderError::InvalidBody(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use facename_core::generator::{FaceImageClient, GeneratorConfig};
    use facename_core::model::{Age, Gender, RequestParams};
    use facename_core::retry::RetryPolicy;
    use facename_core::TrainerError;

    use crate::mock::SAMPLE_PNG_BASE64;

    fn request() -> ImageRequest {
        ImageRequest::new("30-year-old female japanese".into(), 42, 512, 512, 7.5)
    }

    fn backend(server: &MockServer) -> StabilityBackend {
        StabilityBackend::new("test-key", Some(format!("{}/generate", server.uri())), Some(5)).unwrap()
    }

    #[tokio::test]
    async fn successful_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("Authorization", "Bearer test-key"))
            .and(header("Accept", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "width": 512,
                "height": 512,
                "seed": 42,
                "cfg_scale": 7.5,
                "samples": 1,
                "text_prompts": [{ "text": "30-year-old female japanese", "weight": 1.0 }]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "artifacts": [{ "base64": SAMPLE_PNG_BASE64 }] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let body = backend(&server).request_image(&request()).await.unwrap();
        assert_eq!(body["artifacts"][0]["base64"], SAMPLE_PNG_BASE64);
    }

    #[tokio::test]
    async fn error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let err = backend(&server).request_image(&request()).await.unwrap_err();
        match err {
            ProviderError::ApiError { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal error");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_json_success_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = backend(&server).request_image(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidBody(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint() {
        // Bind then drop a server so the port is closed.
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };
        let backend = StabilityBackend::new("k", Some(uri), Some(2)).unwrap();
        let err = backend.request_image(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NetworkError(_) | ProviderError::Timeout(_)));
    }

    #[tokio::test]
    async fn client_retries_failed_attempts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "base64": SAMPLE_PNG_BASE64 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let client = FaceImageClient::new(
            Arc::new(backend(&server)),
            GeneratorConfig {
                app_root: dir.path().to_path_buf(),
                retry: RetryPolicy {
                    max_attempts: 3,
                    base_delay: Duration::from_millis(10),
                },
                ..GeneratorConfig::default()
            },
        );

        let params = RequestParams::new(Age::new(30).unwrap(), Gender::Female);
        let generated = client.generate_face_image(&params).await.unwrap();
        let saved = std::fs::read(dir.path().join(&generated.metadata.image_uri)).unwrap();
        assert_eq!(saved, generated.image_bytes);
    }

    #[tokio::test]
    async fn client_gives_up_after_three_attempts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .expect(3)
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let client = FaceImageClient::new(
            Arc::new(backend(&server)),
            GeneratorConfig {
                app_root: dir.path().to_path_buf(),
                retry: RetryPolicy {
                    max_attempts: 3,
                    base_delay: Duration::from_millis(10),
                },
                ..GeneratorConfig::default()
            },
        );

        let err = client
            .generate_face_image(&RequestParams::default())
            .await
            .unwrap_err();
        match err {
            TrainerError::UpstreamExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last, ProviderError::ApiError { status: 500, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "é".repeat(400);
        let truncated = truncate(body);
        assert!(truncated.len() <= MAX_ERROR_BODY + 3);
        assert!(truncated.ends_with("..."));
    }
}
