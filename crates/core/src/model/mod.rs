mod catalog;
mod completion;
mod ids;
mod progress;
mod quiz;
pub mod streak;

pub use catalog::{Catalog, CatalogError, Course, Lesson, Question, QuestionError};
pub use completion::CompletedLessons;
pub use ids::{CourseId, CourseIdError, LessonSlot, LessonSlotError};
pub use progress::{
    CourseProgress, Percent, ProgressError, ProgressRule, completed_lessons_percent,
    describe_overall, next_stored_percent, overall_progress,
};
pub use quiz::{AnswerFeedback, QuizAttempt, QuizError, QuizScore, QuizStep};
pub use streak::{
    ActivityDay, DEFAULT_ACTIVITY_WINDOW, StudyDateError, StudyDates, compute_streak,
    describe_streak, format_study_date, parse_study_date, recent_activity_window,
};
