//! Key space of the learner's local store.
//!
//! Structured values are JSON encoded; notes are stored as raw text.

use codeclimb_core::model::{CourseId, LessonSlot};

/// Map of course id to completion percentage.
pub const COURSE_PROGRESS: &str = "courseProgress";

/// Array of `YYYY-MM-DD` days with quiz activity.
pub const STUDY_DATES: &str = "studyDates";

/// Raw note text for one lesson slot.
#[must_use]
pub fn note(course: &CourseId, slot: LessonSlot) -> String {
    format!("note-{course}-{slot}")
}

/// Array of 0-based lesson indices completed in a course.
#[must_use]
pub fn completed_lessons(course: &CourseId) -> String {
    format!("completed-{course}")
}
