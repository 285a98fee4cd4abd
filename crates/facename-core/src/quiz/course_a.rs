//! Course A: the name is shown, pick the matching face out of three.

use rand::seq::SliceRandom;
use rand::Rng;

use super::results::TestResults;
use super::{AnswerRecord, Course, QuestionState};
use crate::error::{Result, TrainerError};
use crate::model::FacePairRecord;

/// Distractors per question.
pub const DISTRACTOR_COUNT: usize = 2;

/// One selectable face.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOption {
    pub face: FacePairRecord,
    pub is_correct: bool,
}

#[derive(Debug, Clone)]
struct Question {
    target: FacePairRecord,
    options: Vec<AnswerOption>,
}

/// Result of locking in a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionOutcome {
    pub selected: usize,
    pub is_correct: bool,
    /// Position of the correct option, revealed after the selection.
    pub correct_index: usize,
}

#[derive(Debug, Clone)]
pub struct CourseAQuiz {
    questions: Vec<Question>,
    index: usize,
    state: QuestionState,
    answers: Vec<AnswerRecord>,
}

impl CourseAQuiz {
    /// Build one question per target. Distractors are drawn without
    /// replacement from the faces in `pool` other than the target, then the
    /// options are shuffled.
    pub fn new<R: Rng + ?Sized>(
        targets: Vec<FacePairRecord>,
        pool: &[FacePairRecord],
        rng: &mut R,
    ) -> Result<Self> {
        if targets.is_empty() {
            return Err(TrainerError::InvalidParameter("a test needs at least one question".into()));
        }
        let questions = targets
            .into_iter()
            .map(|target| {
                let others: Vec<&FacePairRecord> = pool.iter().filter(|f| f.id != target.id).collect();
                let mut options: Vec<AnswerOption> = others
                    .choose_multiple(&mut *rng, DISTRACTOR_COUNT)
                    .map(|f| AnswerOption {
                        face: (*f).clone(),
                        is_correct: false,
                    })
                    .collect();
                options.push(AnswerOption {
                    face: target.clone(),
                    is_correct: true,
                });
                options.shuffle(&mut *rng);
                Question { target, options }
            })
            .collect();
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

    /// Name to find, `None` once finished.
    pub fn target_name(&self) -> Option<String> {
        self.current().map(|q| q.target.full_name())
    }

    pub fn options(&self) -> &[AnswerOption] {
        self.current().map(|q| q.options.as_slice()).unwrap_or(&[])
    }

    /// Lock in option `choice`.
    ///
    /// Returns `None` when the current question is already answered, the
    /// quiz is finished, or `choice` is out of range.
    pub fn select(&mut self, choice: usize) -> Option<SelectionOutcome> {
        if self.state != QuestionState::Answering {
            return None;
        }
        let question = self.questions.get(self.index)?;
        let selected = question.options.get(choice)?;
        let correct_index = question.options.iter().position(|o| o.is_correct)?;

        let outcome = SelectionOutcome {
            selected: choice,
            is_correct: selected.is_correct,
            correct_index,
        };
        self.answers.push(AnswerRecord {
            question_index: self.index,
            face_id: question.target.id.clone(),
            correct_answer: question.target.full_name(),
            user_answer: selected.face.full_name(),
            is_correct: selected.is_correct,
            match_level: None,
        });
        self.state = QuestionState::Reviewed;
        Some(outcome)
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
        TestResults::new(Course::A, self.questions.len(), self.answers.clone())
    }

    fn current(&self) -> Option<&Question> {
        if self.state == QuestionState::Finished {
            None
        } else {
            self.questions.get(self.index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::fixtures::faces;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn three_distinct_options_with_one_correct() {
        let pool = faces(5);
        let mut rng = StdRng::seed_from_u64(7);
        let quiz = CourseAQuiz::new(pool.clone(), &pool, &mut rng).unwrap();

        for q in &quiz.questions {
            assert_eq!(q.options.len(), 3);
            assert_eq!(q.options.iter().filter(|o| o.is_correct).count(), 1);
            let correct = q.options.iter().find(|o| o.is_correct).unwrap();
            assert_eq!(correct.face.id, q.target.id);
            let mut ids: Vec<_> = q.options.iter().map(|o| o.face.id.as_str()).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), 3);
        }
    }

    #[test]
    fn correct_option_scores_in_any_position() {
        let pool = faces(3);
        let mut seen_positions = std::collections::HashSet::new();
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut quiz = CourseAQuiz::new(vec![pool[0].clone()], &pool, &mut rng).unwrap();
            let position = quiz.options().iter().position(|o| o.is_correct).unwrap();
            seen_positions.insert(position);

            let outcome = quiz.select(position).unwrap();
            assert!(outcome.is_correct);
            assert_eq!(outcome.correct_index, position);
            assert_eq!(quiz.results().correct_count, 1);
        }
        assert_eq!(seen_positions.len(), 3);
    }

    #[test]
    fn first_selection_locks() {
        let pool = faces(3);
        let mut rng = StdRng::seed_from_u64(1);
        let mut quiz = CourseAQuiz::new(pool.clone(), &pool, &mut rng).unwrap();
        let wrong = quiz.options().iter().position(|o| !o.is_correct).unwrap();
        let right = quiz.options().iter().position(|o| o.is_correct).unwrap();

        let outcome = quiz.select(wrong).unwrap();
        assert!(!outcome.is_correct);
        assert_eq!(outcome.correct_index, right);
        assert_eq!(quiz.state(), QuestionState::Reviewed);
        assert!(quiz.select(right).is_none());
        assert_eq!(quiz.answers().len(), 1);
        assert!(!quiz.answers()[0].is_correct);
    }

    #[test]
    fn walks_to_finished() {
        let pool = faces(4);
        let mut rng = StdRng::seed_from_u64(3);
        let mut quiz = CourseAQuiz::new(pool[..2].to_vec(), &pool, &mut rng).unwrap();

        assert_eq!(quiz.next(), QuestionState::Answering);
        quiz.select(0).unwrap();
        assert_eq!(quiz.next(), QuestionState::Answering);
        assert_eq!(quiz.index(), 1);
        quiz.select(1).unwrap();
        assert_eq!(quiz.next(), QuestionState::Finished);
        assert!(quiz.target_name().is_none());
        assert!(quiz.options().is_empty());

        let results = quiz.results();
        assert_eq!(results.question_count, 2);
        assert_eq!(results.answers.len(), 2);
    }

    #[test]
    fn small_pool_gives_fewer_options() {
        let pool = faces(2);
        let mut rng = StdRng::seed_from_u64(0);
        let quiz = CourseAQuiz::new(vec![pool[0].clone()], &pool, &mut rng).unwrap();
        assert_eq!(quiz.options().len(), 2);
    }

    #[test]
    fn out_of_range_choice() {
        let pool = faces(3);
        let mut rng = StdRng::seed_from_u64(0);
        let mut quiz = CourseAQuiz::new(pool.clone(), &pool, &mut rng).unwrap();
        assert!(quiz.select(3).is_none());
        assert_eq!(quiz.state(), QuestionState::Answering);
    }
}
