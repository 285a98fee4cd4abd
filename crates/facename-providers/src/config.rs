//! Application configuration and backend factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use facename_core::error::TrainerError;
use facename_core::extract::DEFAULT_MAX_DEPTH;
use facename_core::generator::GeneratorConfig;
use facename_core::model::{Age, Distribution, Distributions, Gender, DEFAULT_ETHNICITY};
use facename_core::retry::RetryPolicy;
use facename_core::traits::ImageBackend;

use crate::mock::MockBackend;
use crate::stability::StabilityBackend;

/// Environment variables checked for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["FACENAME_API_KEY", "STABILITY_API_KEY"];

/// Which image backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Stability,
    /// Offline placeholder images.
    Mock,
}

/// Which store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Sqlite,
    Json,
}

/// Upstream API settings.
///
/// Note: Custom Debug impl masks the API key.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct StabilityConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for StabilityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StabilityConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_size")]
    pub width: u32,
    #[serde(default = "default_image_size")]
    pub height: u32,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: default_image_size(),
            height: default_image_size(),
            cfg_scale: default_cfg_scale(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each further one.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Defaults for the interactive trainer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerDefaults {
    #[serde(default = "default_person_count")]
    pub person_count: usize,
    #[serde(default = "default_display_time")]
    pub display_time_secs: u32,
}

impl Default for TrainerDefaults {
    fn default() -> Self {
        Self {
            person_count: default_person_count(),
            display_time_secs: default_display_time(),
        }
    }
}

/// Weighted tables for open buckets. Missing tables use the built-in ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributionsConfig {
    #[serde(default)]
    pub age: Option<Vec<(Age, f64)>>,
    #[serde(default)]
    pub gender: Option<Vec<(Gender, f64)>>,
}

/// Top-level facename configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub store: StoreKind,
    /// Application root; asset paths are relative to it.
    #[serde(default = "default_app_root")]
    pub app_root: PathBuf,
    #[serde(default = "default_ethnicity")]
    pub ethnicity: String,
    /// Nesting limit when searching responses for the image payload.
    #[serde(default = "default_max_depth")]
    pub max_search_depth: usize,
    #[serde(default)]
    pub stability: StabilityConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub trainer: TrainerDefaults,
    #[serde(default)]
    pub distributions: DistributionsConfig,
}

fn default_image_size() -> u32 {
    512
}
fn default_cfg_scale() -> f64 {
    7.5
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_person_count() -> usize {
    5
}
fn default_display_time() -> u32 {
    10
}
fn default_app_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_ethnicity() -> String {
    DEFAULT_ETHNICITY.to_string()
}
fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            store: StoreKind::default(),
            app_root: default_app_root(),
            ethnicity: default_ethnicity(),
            max_search_depth: default_max_depth(),
            stability: StabilityConfig::default(),
            image: ImageConfig::default(),
            retry: RetryConfig::default(),
            trainer: TrainerDefaults::default(),
            distributions: DistributionsConfig::default(),
        }
    }
}

impl TrainerConfig {
    pub fn faces_dir(&self) -> PathBuf {
        self.app_root.join("assets").join("faces")
    }

    pub fn names_dir(&self) -> PathBuf {
        self.app_root.join("assets").join("names")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.app_root.join("assets").join("data")
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir().join("history.json")
    }

    pub fn distributions(&self) -> Result<Distributions, TrainerError> {
        let mut distributions = Distributions::default();
        if let Some(age) = &self.distributions.age {
            distributions.age = Distribution::new(age.clone())?;
        }
        if let Some(gender) = &self.distributions.gender {
            distributions.gender = Distribution::new(gender.clone())?;
        }
        Ok(distributions)
    }

    pub fn generator_config(&self) -> Result<GeneratorConfig, TrainerError> {
        Ok(GeneratorConfig {
            width: self.image.width,
            height: self.image.height,
            cfg_scale: self.image.cfg_scale,
            ethnicity: self.ethnicity.clone(),
            retry: RetryPolicy {
                max_attempts: self.retry.max_attempts,
                base_delay: Duration::from_millis(self.retry.base_delay_ms),
            },
            max_depth: self.max_search_depth,
            app_root: self.app_root.clone(),
            faces_dir: "assets/faces".to_string(),
            distributions: self.distributions()?,
        })
    }

    /// The API key, or a configuration error when the upstream backend is
    /// selected without one.
    pub fn require_api_key(&self) -> Result<&str, TrainerError> {
        self.stability
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                TrainerError::Configuration(format!(
                    "no API key configured; set [stability].api_key or {}",
                    API_KEY_ENV_VARS.join(" / ")
                ))
            })
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + len]).unwrap_or_default();
        result.replace_range(start..start + len + 1, &value);
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `facename.toml` in the current directory
/// 2. `~/.config/facename/config.toml`
///
/// `FACENAME_API_KEY` (then `STABILITY_API_KEY`) overrides the configured key.
pub fn load_config() -> Result<TrainerConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<TrainerConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("facename.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<TrainerConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => TrainerConfig::default(),
    };

    let stability = &mut config.stability;
    stability.api_key = stability.api_key.as_deref().map(resolve_env_vars);
    stability.endpoint = stability.endpoint.as_deref().map(resolve_env_vars);
    if let Some(key) = API_KEY_ENV_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
    {
        stability.api_key = Some(key);
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("facename"))
}

/// Create the configured image backend.
///
/// Selecting the upstream backend without an API key is a startup error.
pub fn create_backend(config: &TrainerConfig) -> Result<Arc<dyn ImageBackend>> {
    match config.backend {
        BackendKind::Stability => {
            let api_key = config.require_api_key()?;
            let backend = StabilityBackend::new(
                api_key,
                config.stability.endpoint.clone(),
                config.stability.timeout_secs,
            )?;
            Ok(Arc::new(backend))
        }
        BackendKind::Mock => Ok(Arc::new(MockBackend::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_FACENAME_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_FACENAME_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_FACENAME_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_FACENAME_UNSET_VAR}"), "");
        assert_eq!(resolve_env_vars("open ${brace"), "open ${brace");
        std::env::remove_var("_FACENAME_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = TrainerConfig::default();
        assert_eq!(config.backend, BackendKind::Stability);
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.trainer.person_count, 5);
        assert_eq!(config.trainer.display_time_secs, 10);
        assert_eq!(config.max_search_depth, 20);
        assert_eq!(config.faces_dir(), PathBuf::from("./assets/faces"));
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
backend = "mock"
store = "json"
app_root = "/srv/facename"

[stability]
api_key = "sk-test"
endpoint = "http://localhost:9000/generate"

[retry]
max_attempts = 5
base_delay_ms = 250

[trainer]
person_count = 8

[distributions]
age = [[20, 0.5], [30, 0.5]]
gender = [["female", 1.0]]
"#;
        let config: TrainerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend, BackendKind::Mock);
        assert_eq!(config.store, StoreKind::Json);
        assert_eq!(config.trainer.person_count, 8);
        assert_eq!(config.trainer.display_time_secs, 10);

        let generator = config.generator_config().unwrap();
        assert_eq!(generator.retry.max_attempts, 5);
        assert_eq!(generator.retry.base_delay, Duration::from_millis(250));
        assert_eq!(generator.app_root, PathBuf::from("/srv/facename"));
        assert_eq!(generator.distributions.gender.entries(), &[(Gender::Female, 1.0)]);
        assert_eq!(generator.distributions.age.entries().len(), 2);
    }

    #[test]
    fn invalid_bucket_in_distribution_is_rejected() {
        let toml_str = "[distributions]\nage = [[25, 1.0]]\n";
        assert!(toml::from_str::<TrainerConfig>(toml_str).is_err());
    }

    #[test]
    fn empty_distribution_is_configuration_error() {
        let toml_str = "[distributions]\ngender = []\n";
        let config: TrainerConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.distributions(),
            Err(TrainerError::Configuration(_))
        ));
    }

    #[test]
    fn negative_weight_is_configuration_error() {
        let toml_str = "[distributions]\nage = [[20, 1.0], [30, -0.5]]\n";
        let config: TrainerConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.generator_config(),
            Err(TrainerError::Configuration(_))
        ));
    }

    #[test]
    fn missing_api_key_is_startup_error() {
        let config = TrainerConfig::default();
        assert!(matches!(
            config.require_api_key(),
            Err(TrainerError::Configuration(_))
        ));
        assert!(create_backend(&config).is_err());

        let mock = TrainerConfig {
            backend: BackendKind::Mock,
            ..TrainerConfig::default()
        };
        assert_eq!(create_backend(&mock).unwrap().name(), "mock");
    }

    #[test]
    fn api_key_is_masked() {
        let config = StabilityConfig {
            api_key: Some("sk-secret".into()),
            ..StabilityConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn explicit_missing_path_fails() {
        let err = load_config_from(Some(Path::new("/nonexistent/facename.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn loads_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("facename.toml");
        std::fs::write(&path, "backend = \"mock\"\n[trainer]\ndisplay_time_secs = 4\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.backend, BackendKind::Mock);
        assert_eq!(config.trainer.display_time_secs, 4);
    }
}
