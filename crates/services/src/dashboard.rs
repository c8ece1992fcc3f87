use std::sync::Arc;

use serde::Serialize;

use codeclimb_core::model::{
    ActivityDay, Catalog, Course, CourseId, LessonSlot, Percent, describe_overall,
    describe_streak,
};

use crate::completion_service::CompletionService;
use crate::error::DashboardError;
use crate::note_service::NoteService;
use crate::progress_service::ProgressService;
use crate::streak_service::StreakService;

/// Home-screen summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub overall: Percent,
    pub streak: u32,
    pub calendar: Vec<ActivityDay>,
}

impl Dashboard {
    #[must_use]
    pub fn overall_label(&self) -> String {
        describe_overall(self.overall)
    }

    #[must_use]
    pub fn streak_label(&self) -> String {
        describe_streak(self.streak)
    }

    #[must_use]
    pub fn studied_days(&self) -> usize {
        self.calendar.iter().filter(|day| day.studied).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonRow {
    pub slot: LessonSlot,
    pub title: String,
    pub completed: bool,
    pub has_quiz: bool,
}

/// One course with its lesson list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseDetail {
    pub course: Course,
    pub percent: Percent,
    pub lessons: Vec<LessonRow>,
}

/// One lesson opened for reading, with its saved note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonView {
    pub course: CourseId,
    pub slot: LessonSlot,
    pub total: usize,
    pub title: String,
    pub markdown: String,
    pub is_first: bool,
    pub is_last: bool,
    pub reading_progress: f64,
    pub has_quiz: bool,
    pub note: String,
}

impl LessonView {
    /// Slot of the previous lesson, if any.
    #[must_use]
    pub fn previous(&self) -> Option<LessonSlot> {
        (!self.is_first).then(|| LessonSlot::from_index(self.slot.index() - 1))
    }

    #[must_use]
    pub fn next(&self) -> Option<LessonSlot> {
        (!self.is_last).then(|| LessonSlot::from_index(self.slot.index() + 1))
    }
}

#[derive(Clone)]
pub struct DashboardService {
    catalog: Arc<Catalog>,
    progress: ProgressService,
    streak: StreakService,
    completion: CompletionService,
    notes: NoteService,
    window: usize,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        progress: ProgressService,
        streak: StreakService,
        completion: CompletionService,
        notes: NoteService,
        window: usize,
    ) -> Self {
        Self {
            catalog,
            progress,
            streak,
            completion,
            notes,
            window,
        }
    }

    /// Overall progress, current streak and the recent-activity grid.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Progress` for an empty catalog, or a storage
    /// error if progress or study days cannot be read.
    pub async fn load(&self) -> Result<Dashboard, DashboardError> {
        let overall = self.progress.overall().await?;
        let streak = self.streak.current_streak().await?;
        let calendar = self.streak.activity_window(self.window).await?;
        Ok(Dashboard {
            overall,
            streak,
            calendar,
        })
    }

    /// Lesson list for one course, flagged with completion.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::UnknownCourse` if the course is not in the
    /// catalog, or a storage error.
    pub async fn course_detail(&self, course: &CourseId) -> Result<CourseDetail, DashboardError> {
        let Some(entry) = self.catalog.course(course) else {
            return Err(DashboardError::UnknownCourse(course.to_string()));
        };
        let percent = self.progress.percent(course).await?;
        let completed = self.completion.load(course).await?;

        let lessons = self
            .catalog
            .lessons(course)
            .into_iter()
            .map(|lesson| LessonRow {
                slot: lesson.slot(),
                title: lesson.title(),
                completed: completed.contains(lesson.slot()),
                has_quiz: !self.catalog.quiz(course, lesson.slot()).is_empty(),
            })
            .collect();

        Ok(CourseDetail {
            course: entry.clone(),
            percent,
            lessons,
        })
    }

    /// Opens one lesson: its markdown, position in the course and the note
    /// saved for it.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::UnknownCourse` if the course is not in the
    /// catalog, `DashboardError::LessonNotFound` if the slot is past the last
    /// lesson, or a storage error if the note cannot be read.
    pub async fn lesson_view(
        &self,
        course: &CourseId,
        slot: LessonSlot,
    ) -> Result<LessonView, DashboardError> {
        if self.catalog.course(course).is_none() {
            return Err(DashboardError::UnknownCourse(course.to_string()));
        }
        let lesson = self
            .catalog
            .lesson(course, slot)
            .ok_or_else(|| DashboardError::LessonNotFound {
                course: course.to_string(),
                slot: slot.value(),
            })?;
        let note = self.notes.load(course, slot).await?;

        Ok(LessonView {
            course: course.clone(),
            slot,
            total: self.catalog.lesson_count(course),
            title: lesson.title(),
            markdown: lesson.markdown().to_string(),
            is_first: lesson.is_first(),
            is_last: lesson.is_last(),
            reading_progress: lesson.reading_progress(),
            has_quiz: !self.catalog.quiz(course, slot).is_empty(),
            note,
        })
    }
}
