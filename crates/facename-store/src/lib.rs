//! Persistent stores for face pairs and monitoring records.
//!
//! Two backends implement the [`FaceStore`](facename_core::traits::FaceStore)
//! and [`MonitoringStore`](facename_core::traits::MonitoringStore) seams:
//! a single SQLite database and a directory of JSON documents.

pub mod error;
pub mod json;
pub mod sqlite;

pub use error::StoreError;
pub use json::JsonFileStore;
pub use sqlite::SqliteStore;

/// File name of the SQLite database inside the data directory.
pub const DATABASE_FILE: &str = "facename.db";
