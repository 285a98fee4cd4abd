//! Wiring from configuration to a ready pairing service.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use facename_core::generator::FaceImageClient;
use facename_core::monitor::GenerationMonitor;
use facename_core::names::NameGenerator;
use facename_core::pairing::PairingService;
use facename_core::traits::{FaceStore, ImageBackend, MonitoringStore};
use facename_providers::{create_backend, load_config_from, StoreKind, TrainerConfig};
use facename_store::{JsonFileStore, SqliteStore, DATABASE_FILE};

pub struct App {
    pub config: TrainerConfig,
    pub service: PairingService,
    pub faces: Arc<dyn FaceStore>,
    pub monitoring: Arc<dyn MonitoringStore>,
}

impl App {
    /// Load the config and build everything, including the image backend.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let backend = create_backend(&config)?;
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: TrainerConfig, backend: Arc<dyn ImageBackend>) -> Result<Self> {
        let (faces, monitoring) = open_stores(&config)?;
        let generator = config.generator_config()?;
        let monitor = GenerationMonitor::new(monitoring.clone(), generator.distributions.clone());
        debug!(backend = backend.name(), "building pairing service");
        let service = PairingService::new(
            FaceImageClient::new(backend, generator),
            NameGenerator::new(config.names_dir()),
            monitor,
            faces.clone(),
        );
        Ok(Self {
            config,
            service,
            faces,
            monitoring,
        })
    }
}

/// Open the configured store for both faces and monitoring records.
pub fn open_stores(config: &TrainerConfig) -> Result<(Arc<dyn FaceStore>, Arc<dyn MonitoringStore>)> {
    let data_dir = config.data_dir();
    match config.store {
        StoreKind::Sqlite => {
            let path = data_dir.join(DATABASE_FILE);
            let store = Arc::new(
                SqliteStore::open(&path)
                    .with_context(|| format!("failed to open database {}", path.display()))?,
            );
            Ok(share(store))
        }
        StoreKind::Json => {
            let store = Arc::new(
                JsonFileStore::open(&data_dir)
                    .with_context(|| format!("failed to open store in {}", data_dir.display()))?,
            );
            Ok(share(store))
        }
    }
}

fn share<S>(store: Arc<S>) -> (Arc<dyn FaceStore>, Arc<dyn MonitoringStore>)
where
    S: FaceStore + MonitoringStore + 'static,
{
    let faces: Arc<dyn FaceStore> = store.clone();
    let monitoring: Arc<dyn MonitoringStore> = store;
    (faces, monitoring)
}
