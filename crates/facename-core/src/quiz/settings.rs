//! Test setup after memorization.

use serde::{Deserialize, Serialize};

use super::Course;
use crate::error::{Result, TrainerError};

/// Which course to run and on which faces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSettings {
    pub course: Course,
    pub question_count: usize,
    /// The first `question_count` memorized ids, in memorization order.
    pub face_ids: Vec<String>,
}

impl TestSettings {
    /// Cap `requested` at the number of memorized faces (and at least one).
    pub fn new(course: Course, requested: usize, memorized: &[String]) -> Result<Self> {
        if memorized.is_empty() {
            return Err(TrainerError::InvalidParameter(
                "no memorized faces to test on".into(),
            ));
        }
        let question_count = requested.clamp(1, memorized.len());
        Ok(Self {
            course,
            question_count,
            face_ids: memorized[..question_count].to_vec(),
        })
    }
}
