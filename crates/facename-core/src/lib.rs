//! facename-core: generation pipeline, monitoring, pairing and quiz logic.
//!
//! This crate defines the data model, the storage and backend traits, and the
//! components that turn an image backend plus a name list into persisted
//! face-name pairs, as well as the quiz state machines that consume them.

pub mod api;
pub mod error;
pub mod extract;
pub mod generator;
pub mod history;
pub mod model;
pub mod monitor;
pub mod names;
pub mod pairing;
pub mod quiz;
pub mod retry;
pub mod store;
pub mod traits;

pub use error::{ProviderError, TrainerError};
