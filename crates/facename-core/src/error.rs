//! Error types for the generation pipeline.
//!
//! `ProviderError` describes a single failed attempt against the image
//! backend. `TrainerError` is the taxonomy surfaced by the core components;
//! each kind maps to its own user-facing message so callers never have to show
//! internal detail strings.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of one request attempt against the image backend.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A transport-level error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The API answered 200 but the body was not JSON.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

/// Errors surfaced by the name generator, image client, monitor and pairing
/// service.
#[derive(Debug, Error)]
pub enum TrainerError {
    /// Age, gender or seed outside the accepted values.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Every attempt of the retry policy failed.
    #[error("failed after {attempts} attempts: {last}")]
    UpstreamExhausted {
        attempts: u32,
        #[source]
        last: ProviderError,
    },

    /// The response did not contain anything that looks like an image payload.
    #[error("no image data in API response")]
    NoImageData,

    /// A payload was found but could not be decoded.
    #[error("failed to decode image payload: {0}")]
    DecodeError(String),

    /// Writing an image file or a store record failed.
    #[error("storage write failed: {0}")]
    StorageWriteError(String),

    /// Reading from the store failed.
    #[error("storage read failed: {0}")]
    StorageReadError(String),

    /// A name list file does not exist.
    #[error("name list not found: {}", .0.display())]
    ResourceMissing(PathBuf),

    /// A name list file exists but has no usable lines.
    #[error("name list is empty: {}", .0.display())]
    ResourceEmpty(PathBuf),

    /// A requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Startup configuration is incomplete.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl TrainerError {
    /// Stable machine-readable kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            TrainerError::InvalidParameter(_) => "invalid_parameter",
            TrainerError::UpstreamExhausted { .. } => "upstream_exhausted",
            TrainerError::NoImageData => "no_image_data",
            TrainerError::DecodeError(_) => "decode_error",
            TrainerError::StorageWriteError(_) => "storage_write_error",
            TrainerError::StorageReadError(_) => "storage_read_error",
            TrainerError::ResourceMissing(_) => "resource_missing",
            TrainerError::ResourceEmpty(_) => "resource_empty",
            TrainerError::NotFound(_) => "not_found",
            TrainerError::Configuration(_) => "configuration",
        }
    }

    /// Message suitable for showing to the person using the trainer.
    pub fn user_message(&self) -> String {
        match self {
            TrainerError::InvalidParameter(detail) => {
                format!("The request was not valid: {detail}.")
            }
            TrainerError::UpstreamExhausted { .. } => {
                "The image service is not responding right now. Please try again later.".into()
            }
            TrainerError::NoImageData => {
                "The image service returned no picture for this request.".into()
            }
            TrainerError::DecodeError(_) => {
                "The image service returned a picture that could not be read.".into()
            }
            TrainerError::StorageWriteError(_) => "Generated data could not be saved.".into(),
            TrainerError::StorageReadError(_) => "Saved data could not be loaded.".into(),
            TrainerError::ResourceMissing(_) => "A name list is missing from the installation.".into(),
            TrainerError::ResourceEmpty(_) => "A name list in the installation is empty.".into(),
            TrainerError::NotFound(_) => "No face matches the given id.".into(),
            TrainerError::Configuration(_) => "The application is not configured correctly.".into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_carries_last_attempt() {
        let err = TrainerError::UpstreamExhausted {
            attempts: 3,
            last: ProviderError::ApiError {
                status: 503,
                message: "busy".into(),
            },
        };
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("503"));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("busy"));
    }

    #[test]
    fn user_messages_hide_detail() {
        let err = TrainerError::StorageWriteError("/secret/path: permission denied".into());
        assert!(!err.user_message().contains("/secret/path"));

        let err = TrainerError::DecodeError("Invalid byte 33, offset 4".into());
        assert!(!err.user_message().contains("offset"));
    }

    #[test]
    fn user_messages_are_distinct_per_kind() {
        let errors = vec![
            TrainerError::InvalidParameter("age".into()),
            TrainerError::UpstreamExhausted {
                attempts: 3,
                last: ProviderError::Timeout(120),
            },
            TrainerError::NoImageData,
            TrainerError::DecodeError("x".into()),
            TrainerError::StorageWriteError("x".into()),
            TrainerError::StorageReadError("x".into()),
            TrainerError::ResourceMissing("a.txt".into()),
            TrainerError::ResourceEmpty("a.txt".into()),
            TrainerError::NotFound("x".into()),
            TrainerError::Configuration("x".into()),
        ];
        let mut messages: Vec<String> = errors.iter().map(|e| e.user_message()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), errors.len());
    }
}
