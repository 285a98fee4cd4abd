//! Quiz state machines: timed memorization, the two test courses, results and
//! the session state carried between them.
//!
//! The machines are plain synchronous values. The caller drives them (a timer
//! calls [`memorize::MemorizationSession::tick`] once per second, key input
//! calls the answer methods) and never from two places at once.

pub mod course_a;
pub mod course_b;
pub mod memorize;
pub mod results;
pub mod session;
pub mod settings;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrainerError;

pub use course_a::{AnswerOption, CourseAQuiz, SelectionOutcome};
pub use course_b::{validate_answer, CourseBQuiz, MatchLevel, Submission};
pub use memorize::{MemorizationSession, MemorizeState, TickEvent};
pub use results::{ResultDetail, TestResults};
pub use session::SessionState;
pub use settings::TestSettings;

/// The two test courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Course {
    /// Name shown, pick the face.
    #[serde(rename = "a")]
    A,
    /// Face shown, type the name.
    #[serde(rename = "b")]
    B,
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Course::A => write!(f, "a"),
            Course::B => write!(f, "b"),
        }
    }
}

impl FromStr for Course {
    type Err = TrainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Course::A),
            "b" => Ok(Course::B),
            other => Err(TrainerError::InvalidParameter(format!(
                "course must be 'a' or 'b', got '{other}'"
            ))),
        }
    }
}

/// Whether the current question still accepts an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionState {
    Answering,
    Reviewed,
    Finished,
}

/// What the user answered for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub face_id: String,
    pub correct_answer: String,
    pub user_answer: String,
    pub is_correct: bool,
    /// Only set for course B.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_level: Option<MatchLevel>,
}
