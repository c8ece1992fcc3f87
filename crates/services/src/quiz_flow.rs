use std::sync::Arc;

use log::info;
use serde::Serialize;

use codeclimb_core::model::{Catalog, CourseId, LessonSlot, Percent, QuizAttempt, QuizError, QuizScore};

use crate::completion_service::CompletionService;
use crate::error::QuizFlowError;
use crate::progress_service::ProgressService;
use crate::streak_service::StreakService;

/// What finishing a quiz changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizCompletion {
    pub percent: Percent,
    pub score: QuizScore,
    pub newly_studied_today: bool,
    pub streak: u32,
}

/// Starts lesson quizzes and applies their results to progress and streak.
#[derive(Clone)]
pub struct QuizFlowService {
    catalog: Arc<Catalog>,
    progress: ProgressService,
    streak: StreakService,
    completion: CompletionService,
}

impl QuizFlowService {
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        progress: ProgressService,
        streak: StreakService,
        completion: CompletionService,
    ) -> Self {
        Self {
            catalog,
            progress,
            streak,
            completion,
        }
    }

    /// Begin an attempt at the quiz for one lesson slot.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::UnknownCourse` if the course is not in the
    /// catalog, or `QuizFlowError::Quiz` if the slot has no questions.
    pub fn start(&self, course: &CourseId, slot: LessonSlot) -> Result<QuizAttempt, QuizFlowError> {
        if self.catalog.course(course).is_none() {
            return Err(QuizFlowError::UnknownCourse(course.to_string()));
        }
        let questions = self.catalog.quiz(course, slot).to_vec();
        Ok(QuizAttempt::new(questions)?)
    }

    /// Persist a finished attempt.
    ///
    /// Marks the lesson completed, updates the course percentage and records
    /// today as a study day, in that order.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::Quiz` if the last question was never answered,
    /// `QuizFlowError::UnknownCourse` for a course outside the catalog, or a
    /// storage error from any of the writes.
    pub async fn finish(
        &self,
        course: &CourseId,
        slot: LessonSlot,
        attempt: &QuizAttempt,
    ) -> Result<QuizCompletion, QuizFlowError> {
        if !attempt.is_complete() {
            return Err(QuizError::NotAnswered.into());
        }
        if self.catalog.course(course).is_none() {
            return Err(QuizFlowError::UnknownCourse(course.to_string()));
        }

        self.completion.mark(course, slot).await?;
        let percent = self.progress.record_quiz_completion(course).await?;
        let newly_studied_today = self.streak.record_today().await?;
        let streak = self.streak.current_streak().await?;
        let score = attempt.score();

        info!(
            "finished quiz {slot} of {course}: {}/{} correct, course at {percent}, streak {streak}",
            score.correct, score.total
        );
        Ok(QuizCompletion {
            percent,
            score,
            newly_studied_today,
            streak,
        })
    }
}
