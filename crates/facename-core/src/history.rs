//! Durable progress history: finished test runs and per-face weakness.
//!
//! Kept as one JSON document. Only the last [`MAX_RESULTS`] runs are
//! retained.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrainerError};
use crate::quiz::{Course, TestResults};

/// Number of runs kept in the history.
pub const MAX_RESULTS: usize = 100;

/// Faces need this many attempts before they are ranked as weak.
pub const MIN_ATTEMPTS_FOR_RANKING: u32 = 2;

/// Summary of one finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub course: Course,
    pub question_count: usize,
    pub correct_count: usize,
    pub accuracy: u32,
}

/// Running tally for one face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceStats {
    pub name: String,
    pub attempts: u32,
    pub correct: u32,
    pub last_seen: DateTime<Utc>,
    /// `1 - correct / attempts`.
    pub weakness_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HistoryData {
    #[serde(default)]
    results: Vec<RunSummary>,
    #[serde(default)]
    weak_faces: BTreeMap<String, FaceStats>,
}

/// Progress history backed by a JSON file.
#[derive(Debug, Clone)]
pub struct ProgressHistory {
    path: PathBuf,
    data: HistoryData,
}

impl ProgressHistory {
    /// Load the history at `path`; a missing file is an empty history.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| TrainerError::StorageReadError(format!("{}: {e}", path.display())))?;
            serde_json::from_str(&content)
                .map_err(|e| TrainerError::StorageReadError(format!("{}: {e}", path.display())))?
        } else {
            HistoryData::default()
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a finished run and update the per-face tallies.
    pub fn record(&mut self, results: &TestResults) {
        let now = Utc::now();
        self.data.results.push(RunSummary {
            timestamp: now,
            course: results.course,
            question_count: results.question_count,
            correct_count: results.correct_count,
            accuracy: results.accuracy(),
        });
        let overflow = self.data.results.len().saturating_sub(MAX_RESULTS);
        self.data.results.drain(..overflow);

        for answer in &results.answers {
            let stats = self
                .data
                .weak_faces
                .entry(answer.face_id.clone())
                .or_insert_with(|| FaceStats {
                    name: answer.correct_answer.clone(),
                    attempts: 0,
                    correct: 0,
                    last_seen: now,
                    weakness_score: 0.0,
                });
            stats.attempts += 1;
            if answer.is_correct {
                stats.correct += 1;
            }
            stats.last_seen = now;
            stats.weakness_score = 1.0 - stats.correct as f64 / stats.attempts as f64;
        }
    }

    /// Write the history back to its file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TrainerError::StorageWriteError(format!("{}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| TrainerError::StorageWriteError(e.to_string()))?;
        std::fs::write(&self.path, json)
            .map_err(|e| TrainerError::StorageWriteError(format!("{}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), runs = self.data.results.len(), "saved progress history");
        Ok(())
    }

    /// Most recent runs, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&RunSummary> {
        self.data.results.iter().rev().take(limit).collect()
    }

    pub fn run_count(&self) -> usize {
        self.data.results.len()
    }

    /// Mean accuracy over the retained runs.
    pub fn average_accuracy(&self) -> Option<f64> {
        if self.data.results.is_empty() {
            return None;
        }
        let total: u32 = self.data.results.iter().map(|r| r.accuracy).sum();
        Some(total as f64 / self.data.results.len() as f64)
    }

    pub fn face_stats(&self, face_id: &str) -> Option<&FaceStats> {
        self.data.weak_faces.get(face_id)
    }

    /// Faces with enough attempts, weakest first.
    pub fn weakest(&self, limit: usize) -> Vec<(&str, &FaceStats)> {
        let mut ranked: Vec<(&str, &FaceStats)> = self
            .data
            .weak_faces
            .iter()
            .filter(|(_, s)| s.attempts >= MIN_ATTEMPTS_FOR_RANKING)
            .map(|(id, s)| (id.as_str(), s))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.weakness_score
                .total_cmp(&a.1.weakness_score)
                .then_with(|| b.1.attempts.cmp(&a.1.attempts))
        });
        ranked.truncate(limit);
        ranked
    }
}
