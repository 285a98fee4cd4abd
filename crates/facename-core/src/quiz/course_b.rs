//! Course B: the face is shown, type the name.

use serde::{Deserialize, Serialize};

use super::results::TestResults;
use super::{AnswerRecord, Course, QuestionState};
use crate::error::{Result, TrainerError};
use crate::model::FacePairRecord;

/// How close a typed answer is to the correct name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLevel {
    Exact,
    /// Equal once all whitespace is removed.
    Normalized,
    FamilyOnly,
    GivenOnly,
    None,
}

impl MatchLevel {
    pub fn is_correct(self) -> bool {
        matches!(self, MatchLevel::Exact | MatchLevel::Normalized)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchLevel::Exact => "exact",
            MatchLevel::Normalized => "normalized",
            MatchLevel::FamilyOnly => "family_only",
            MatchLevel::GivenOnly => "given_only",
            MatchLevel::None => "none",
        }
    }
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Classify `input` against `correct` ("family given").
pub fn validate_answer(input: &str, correct: &str) -> MatchLevel {
    if input == correct {
        return MatchLevel::Exact;
    }
    if strip_whitespace(input) == strip_whitespace(correct) {
        return MatchLevel::Normalized;
    }
    let parts: Vec<&str> = correct.split(' ').collect();
    if let [family, given] = parts.as_slice() {
        if input == *family {
            return MatchLevel::FamilyOnly;
        }
        if input == *given {
            return MatchLevel::GivenOnly;
        }
    }
    MatchLevel::None
}

/// Outcome of [`CourseBQuiz::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Blank input; the question stays open.
    Empty,
    /// The question was already answered or the quiz is over.
    Ignored,
    Checked {
        match_level: MatchLevel,
        correct_name: String,
    },
}

#[derive(Debug, Clone)]
pub struct CourseBQuiz {
    questions: Vec<FacePairRecord>,
    index: usize,
    state: QuestionState,
    answers: Vec<AnswerRecord>,
}

impl CourseBQuiz {
    pub fn new(questions: Vec<FacePairRecord>) -> Result<Self> {
        if questions.is_empty() {
            return Err(TrainerError::InvalidParameter("a test needs at least one question".into()));
        }
        Ok(Self {
            questions,
            index: 0,
            state: QuestionState::Answering,
            answers: Vec::new(),
        })
    }

    pub fn state(&self) -> QuestionState {
        self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn progress(&self) -> f64 {
        (self.index + 1) as f64 / self.questions.len() as f64
    }

    /// Face to name, `None` once finished.
    pub fn current(&self) -> Option<&FacePairRecord> {
        if self.state == QuestionState::Finished {
            None
        } else {
            self.questions.get(self.index)
        }
    }

    /// Check a typed answer. The input is trimmed first.
    pub fn submit(&mut self, input: &str) -> Submission {
        if self.state != QuestionState::Answering {
            return Submission::Ignored;
        }
        let input = input.trim();
        if input.is_empty() {
            return Submission::Empty;
        }
        let Some(face) = self.questions.get(self.index) else {
            return Submission::Ignored;
        };
        let correct_name = face.full_name();
        let match_level = validate_answer(input, &correct_name);
        self.answers.push(AnswerRecord {
            question_index: self.index,
            face_id: face.id.clone(),
            correct_answer: correct_name.clone(),
            user_answer: input.to_string(),
            is_correct: match_level.is_correct(),
            match_level: Some(match_level),
        });
        self.state = QuestionState::Reviewed;
        Submission::Checked {
            match_level,
            correct_name,
        }
    }

    /// Move past a reviewed question.
    pub fn next(&mut self) -> QuestionState {
        if self.state == QuestionState::Reviewed {
            if self.index + 1 >= self.questions.len() {
                self.state = QuestionState::Finished;
            } else {
                self.index += 1;
                self.state = QuestionState::Answering;
            }
        }
        self.state
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn results(&self) -> TestResults {
        TestResults::new(Course::B, self.questions.len(), self.answers.clone())
    }
}
