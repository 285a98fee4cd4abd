//! Core data model types for facename.
//!
//! Demographic buckets, persisted face-name pairs, monitoring records and the
//! weighted distributions used when a caller does not pin a bucket.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainerError};

/// Exclusive upper bound for generation seeds.
pub const MAX_SEED: u32 = 1_000_000_000;

/// Ethnicity tag used in prompts and stored on every pair.
pub const DEFAULT_ETHNICITY: &str = "japanese";

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// One of the six age buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Age(u32);

impl Age {
    /// All valid buckets in ascending order.
    pub const ALL: [Age; 6] = [Age(20), Age(30), Age(40), Age(50), Age(60), Age(70)];

    pub fn new(years: u32) -> Result<Self> {
        validate_age(i64::from(years))
    }

    pub fn years(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Age {
    type Error = TrainerError;

    fn try_from(value: u32) -> Result<Self> {
        Age::new(value)
    }
}

impl From<Age> for u32 {
    fn from(age: Age) -> Self {
        age.0
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Age {
    type Err = TrainerError;

    fn from_str(s: &str) -> Result<Self> {
        let years: i64 = s
            .trim()
            .parse()
            .map_err(|_| invalid_age(s.trim()))?;
        validate_age(years)
    }
}

/// One of the two gender buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = TrainerError;

    fn from_str(s: &str) -> Result<Self> {
        validate_gender(s)
    }
}

fn invalid_age(raw: impl fmt::Display) -> TrainerError {
    TrainerError::InvalidParameter(format!(
        "age {raw} is not one of 20, 30, 40, 50, 60, 70"
    ))
}

/// Validate a raw age value against the six buckets.
pub fn validate_age(years: i64) -> Result<Age> {
    Age::ALL
        .iter()
        .copied()
        .find(|age| i64::from(age.0) == years)
        .ok_or_else(|| invalid_age(years))
}

/// Validate a raw gender value against the two buckets.
pub fn validate_gender(raw: &str) -> Result<Gender> {
    match raw {
        "male" => Ok(Gender::Male),
        "female" => Ok(Gender::Female),
        other => Err(TrainerError::InvalidParameter(format!(
            "gender '{other}' is not one of male, female"
        ))),
    }
}

/// Validate a raw seed value.
pub fn validate_seed(seed: i64) -> Result<u32> {
    if (0..i64::from(MAX_SEED)).contains(&seed) {
        Ok(seed as u32)
    } else {
        Err(TrainerError::InvalidParameter(format!(
            "seed {seed} is outside 0..{MAX_SEED}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Parameters of one generation request, as the caller asked for them.
///
/// Missing buckets are resolved by the image client from its distributions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParams {
    #[serde(default)]
    pub age: Option<Age>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub seed: Option<u32>,
}

impl RequestParams {
    pub fn new(age: Age, gender: Gender) -> Self {
        Self {
            age: Some(age),
            gender: Some(gender),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build from unvalidated input, rejecting anything outside the buckets.
    pub fn from_raw(age: Option<i64>, gender: Option<&str>, seed: Option<i64>) -> Result<Self> {
        Ok(Self {
            age: age.map(validate_age).transpose()?,
            gender: gender.map(validate_gender).transpose()?,
            seed: seed.map(validate_seed).transpose()?,
        })
    }
}

/// Optional age/gender filter for store queries and pair generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairConditions {
    #[serde(default)]
    pub age: Option<Age>,
    #[serde(default)]
    pub gender: Option<Gender>,
}

impl PairConditions {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn matches(&self, record: &FacePairRecord) -> bool {
        self.age.map_or(true, |a| a == record.age) && self.gender.map_or(true, |g| g == record.gender)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Family and given name drawn from the name lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameParts {
    pub family_name: String,
    pub given_name: String,
}

/// Metadata describing a generated and saved face image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub id: String,
    pub filename: String,
    /// Path relative to the application root.
    pub image_uri: String,
    pub age: Age,
    pub gender: Gender,
    pub ethnicity: String,
    pub seed: u32,
    pub finish_reason: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted association of one face image with one name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacePairRecord {
    pub id: String,
    pub image_uri: String,
    pub age: Age,
    pub gender: Gender,
    pub family_name: String,
    pub given_name: String,
    pub ethnicity: String,
    pub seed: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl FacePairRecord {
    /// Name as shown to the user: family name first, separated by a space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.family_name, self.given_name)
    }
}

/// Latency and outcome of one monitored call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub response_time_ms: u64,
    pub success: bool,
}

/// Placeholder quality metrics.
///
/// These values are random numbers in fixed ranges and carry no information
/// about the image. They are kept so monitoring records keep their shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub quality_score: f64,
    pub prompt_compliance: f64,
}

/// Error captured by the monitor for a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub message: String,
    /// Source chain of the error, outermost first.
    #[serde(default)]
    pub trace: Option<String>,
}

/// One record per monitored generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub request_params: RequestParams,
    pub performance: Performance,
    pub quality: Option<QualityMetrics>,
    pub errors: Option<ErrorDetails>,
}

// ---------------------------------------------------------------------------
// Distributions
// ---------------------------------------------------------------------------

/// Weighted table over a fixed, ordered set of keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution<T> {
    entries: Vec<(T, f64)>,
}

impl<T: Copy> Distribution<T> {
    /// Build a distribution. Weights are used as given; `entries` must not be
    /// empty and every weight must be finite and non-negative.
    pub fn new(entries: Vec<(T, f64)>) -> Result<Self> {
        if entries.is_empty() {
            return Err(TrainerError::Configuration(
                "distribution must have at least one entry".into(),
            ));
        }
        if let Some((_, weight)) = entries.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(TrainerError::Configuration(format!(
                "distribution weight {weight} must be finite and non-negative"
            )));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(T, f64)] {
        &self.entries
    }

    /// Return the first key whose cumulative weight exceeds `r`.
    ///
    /// Falls back to the first key when floating-point drift leaves `r`
    /// unmatched.
    pub fn pick(&self, r: f64) -> T {
        let mut sum = 0.0;
        for (key, weight) in &self.entries {
            sum += weight;
            if r < sum {
                return *key;
            }
        }
        self.entries[0].0
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.pick(rng.gen::<f64>())
    }
}

/// Age and gender tables used when a request leaves a bucket open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distributions {
    pub age: Distribution<Age>,
    pub gender: Distribution<Gender>,
}

impl Default for Distributions {
    fn default() -> Self {
        Self {
            age: Distribution {
                entries: vec![
                    (Age(20), 0.25),
                    (Age(30), 0.25),
                    (Age(40), 0.20),
                    (Age(50), 0.15),
                    (Age(60), 0.10),
                    (Age(70), 0.05),
                ],
            },
            gender: Distribution {
                entries: vec![(Gender::Male, 0.5), (Gender::Female, 0.5)],
            },
        }
    }
}

impl Distributions {
    /// Fill in the buckets the caller left open.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        age: Option<Age>,
        gender: Option<Gender>,
        rng: &mut R,
    ) -> (Age, Gender) {
        let age = age.unwrap_or_else(|| self.age.sample(rng));
        let gender = gender.unwrap_or_else(|| self.gender.sample(rng));
        (age, gender)
    }
}
