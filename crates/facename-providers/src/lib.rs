//! facename-providers: image backends and application configuration.
//!
//! Implements the `ImageBackend` trait for the Stability AI HTTP API and an
//! offline mock, and loads `facename.toml`.

pub mod config;
pub mod mock;
pub mod stability;

pub use config::{create_backend, load_config, load_config_from, BackendKind, StoreKind, TrainerConfig};
pub use mock::MockBackend;
pub use stability::StabilityBackend;
