//! Scored outcome of a finished test.

use serde::{Deserialize, Serialize};

use super::{AnswerRecord, Course};
use crate::model::FacePairRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResults {
    pub course: Course,
    pub question_count: usize,
    pub correct_count: usize,
    pub answers: Vec<AnswerRecord>,
}

/// One answer joined with the stored pair it was about.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultDetail {
    pub face: FacePairRecord,
    pub answer: AnswerRecord,
}

impl TestResults {
    pub fn new(course: Course, question_count: usize, answers: Vec<AnswerRecord>) -> Self {
        let correct_count = answers.iter().filter(|a| a.is_correct).count();
        Self {
            course,
            question_count,
            correct_count,
            answers,
        }
    }

    /// Percentage of correct answers, rounded to the nearest integer.
    pub fn accuracy(&self) -> u32 {
        if self.question_count == 0 {
            return 0;
        }
        (self.correct_count as f64 / self.question_count as f64 * 100.0).round() as u32
    }

    /// Join each answer with its pair. Answers whose pair cannot be found are
    /// skipped.
    pub fn details<F>(&self, mut lookup: F) -> Vec<ResultDetail>
    where
        F: FnMut(&str) -> Option<FacePairRecord>,
    {
        self.answers
            .iter()
            .filter_map(|answer| {
                lookup(&answer.face_id).map(|face| ResultDetail {
                    face,
                    answer: answer.clone(),
                })
            })
            .collect()
    }
}
