use serde::Serialize;
use thiserror::Error;

use crate::model::catalog::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no quiz for this lesson")]
    NoQuestions,

    #[error("option {index} does not exist (question has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },

    #[error("please select an answer first")]
    NothingSelected,

    #[error("current question has not been answered")]
    NotAnswered,
}

/// Feedback shown after submitting an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_index: usize,
    pub is_last: bool,
}

/// Where the attempt stands after moving forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    /// Now showing the question at this 1-based position.
    Question(usize),
    /// The last question was answered; the quiz can be finished.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

/// One pass through a lesson's question set.
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    questions: Vec<Question>,
    current: usize,
    selected: Option<usize>,
    answers: Vec<Option<bool>>,
}

impl QuizAttempt {
    /// Starts an attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty question set.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        let answers = vec![None; questions.len()];
        Ok(Self {
            questions,
            current: 0,
            selected: None,
            answers,
        })
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    /// 1-based position of the current question.
    #[must_use]
    pub fn position(&self) -> usize {
        self.current + 1
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Fraction of the quiz reached, in (0, 1].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        self.position() as f64 / self.questions.len() as f64
    }

    /// Selects an option of the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::OptionOutOfRange` if the option does not exist.
    pub fn select(&mut self, option: usize) -> Result<(), QuizError> {
        let len = self.current_question().options().len();
        if option >= len {
            return Err(QuizError::OptionOutOfRange { index: option, len });
        }
        self.selected = Some(option);
        Ok(())
    }

    /// Checks the selected option against the answer key.
    ///
    /// Submitting again overwrites the recorded answer for this question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NothingSelected` when no option is selected.
    pub fn submit(&mut self) -> Result<AnswerFeedback, QuizError> {
        let option = self.selected.ok_or(QuizError::NothingSelected)?;
        let question = self.current_question();
        let correct = question.is_correct(option);
        let correct_index = question.answer_index();
        self.answers[self.current] = Some(correct);
        Ok(AnswerFeedback {
            correct,
            correct_index,
            is_last: self.is_last(),
        })
    }

    /// Moves past an answered question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotAnswered` if the current question was not submitted.
    pub fn advance(&mut self) -> Result<QuizStep, QuizError> {
        if self.answers[self.current].is_none() {
            return Err(QuizError::NotAnswered);
        }
        if self.is_last() {
            return Ok(QuizStep::Finished);
        }
        self.current += 1;
        self.selected = None;
        Ok(QuizStep::Question(self.position()))
    }

    /// Steps back one question, clearing the selection. Returns `false` on
    /// the first question.
    pub fn back(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        self.selected = None;
        true
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answers.last().is_some_and(Option::is_some)
    }

    #[must_use]
    pub fn score(&self) -> QuizScore {
        QuizScore {
            correct: self.answers.iter().filter(|a| **a == Some(true)).count(),
            total: self.questions.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: usize) -> Question {
        Question::new(
            "Pick",
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            answer,
        )
        .unwrap()
    }

    #[test]
    fn empty_set_cannot_start() {
        assert_eq!(QuizAttempt::new(Vec::new()).unwrap_err(), QuizError::NoQuestions);
    }

    #[test]
    fn submit_requires_a_selection() {
        let mut quiz = QuizAttempt::new(vec![question(0)]).unwrap();
        assert_eq!(quiz.submit().unwrap_err(), QuizError::NothingSelected);
        assert_eq!(quiz.advance().unwrap_err(), QuizError::NotAnswered);
    }

    #[test]
    fn select_rejects_missing_option() {
        let mut quiz = QuizAttempt::new(vec![question(0)]).unwrap();
        assert_eq!(
            quiz.select(3).unwrap_err(),
            QuizError::OptionOutOfRange { index: 3, len: 3 }
        );
    }

    #[test]
    fn walks_through_questions_and_scores() {
        let mut quiz = QuizAttempt::new(vec![question(2), question(0)]).unwrap();
        assert!((quiz.progress() - 0.5).abs() < f64::EPSILON);

        quiz.select(2).unwrap();
        let feedback = quiz.submit().unwrap();
        assert!(feedback.correct);
        assert!(!feedback.is_last);
        assert_eq!(quiz.advance().unwrap(), QuizStep::Question(2));
        assert_eq!(quiz.selected(), None);

        quiz.select(1).unwrap();
        let feedback = quiz.submit().unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.correct_index, 0);
        assert!(feedback.is_last);
        assert_eq!(quiz.advance().unwrap(), QuizStep::Finished);

        assert!(quiz.is_complete());
        assert_eq!(quiz.score(), QuizScore { correct: 1, total: 2 });
    }

    #[test]
    fn back_clears_selection_and_stops_at_first() {
        let mut quiz = QuizAttempt::new(vec![question(0), question(1)]).unwrap();
        assert!(!quiz.back());
        quiz.select(0).unwrap();
        quiz.submit().unwrap();
        quiz.advance().unwrap();
        quiz.select(1).unwrap();
        assert!(quiz.back());
        assert_eq!(quiz.position(), 1);
        assert_eq!(quiz.selected(), None);
    }
}
