use std::collections::{HashMap, HashSet};

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, LessonSlot};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least one option")]
    NoOptions,

    #[error("answer index {index} is out of range for {len} options")]
    AnswerOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate course id: {id}")]
    DuplicateCourse { id: CourseId },

    #[error("course title cannot be empty: {id}")]
    EmptyTitle { id: CourseId },

    #[error("invalid question {question} in quiz {slot} of {course}: {source}")]
    InvalidQuestion {
        course: CourseId,
        slot: LessonSlot,
        question: usize,
        #[source]
        source: QuestionError,
    },
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// A course track as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    id: CourseId,
    title: String,
}

impl Course {
    #[must_use]
    pub fn new(id: CourseId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    answer_index: usize,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, there are no options,
    /// or the answer index does not point at an option.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        answer_index: usize,
    ) -> Result<Self, QuestionError> {
        let question = Self {
            prompt: prompt.into(),
            options,
            answer_index,
        };
        question.validate()?;
        Ok(question)
    }

    fn validate(&self) -> Result<(), QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if self.answer_index >= self.options.len() {
            return Err(QuestionError::AnswerOutOfRange {
                index: self.answer_index,
                len: self.options.len(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn answer_index(&self) -> usize {
        self.answer_index
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.answer_index
    }
}

/// Borrowed view of one lesson inside a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lesson<'a> {
    slot: LessonSlot,
    total: usize,
    markdown: &'a str,
}

impl<'a> Lesson<'a> {
    #[must_use]
    pub fn slot(&self) -> LessonSlot {
        self.slot
    }

    #[must_use]
    pub fn markdown(&self) -> &'a str {
        self.markdown
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.slot.index() == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.slot.index() + 1 == self.total
    }

    /// Fraction of the course read once this lesson is open, in (0, 1].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn reading_progress(&self) -> f64 {
        (self.slot.index() + 1) as f64 / self.total as f64
    }

    /// Text of the first markdown heading, or the first non-empty line.
    #[must_use]
    pub fn title(&self) -> String {
        heading_text(self.markdown).unwrap_or_else(|| first_line(self.markdown))
    }
}

fn heading_text(markdown: &str) -> Option<String> {
    let mut in_heading = false;
    let mut text = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { .. }) => in_heading = true,
            Event::End(TagEnd::Heading(_)) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
                in_heading = false;
                text.clear();
            }
            Event::Text(chunk) | Event::Code(chunk) if in_heading => text.push_str(&chunk),
            _ => {}
        }
    }
    None
}

fn first_line(markdown: &str) -> String {
    markdown
        .lines()
        .map(|line| line.trim_start_matches('#').trim())
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    courses: Vec<Course>,
    #[serde(default)]
    lessons: HashMap<CourseId, Vec<String>>,
    #[serde(default)]
    quizzes: HashMap<CourseId, Vec<Vec<Question>>>,
}

/// Static course content: ordered courses, lesson markdown and quiz sets.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: Vec<Course>,
    lessons: HashMap<CourseId, Vec<String>>,
    quizzes: HashMap<CourseId, Vec<Vec<Question>>>,
}

impl Catalog {
    /// Builds a catalog from its parts, validating ids and questions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for duplicate ids, blank titles or invalid questions.
    pub fn new(
        courses: Vec<Course>,
        lessons: HashMap<CourseId, Vec<String>>,
        quizzes: HashMap<CourseId, Vec<Vec<Question>>>,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for course in &courses {
            if !seen.insert(course.id.clone()) {
                return Err(CatalogError::DuplicateCourse {
                    id: course.id.clone(),
                });
            }
            if course.title.trim().is_empty() {
                return Err(CatalogError::EmptyTitle {
                    id: course.id.clone(),
                });
            }
        }

        // Deserialized questions skip the constructor, so check them here.
        for (course, sets) in &quizzes {
            for (set_index, set) in sets.iter().enumerate() {
                for (question_index, question) in set.iter().enumerate() {
                    question
                        .validate()
                        .map_err(|source| CatalogError::InvalidQuestion {
                            course: course.clone(),
                            slot: LessonSlot::from_index(set_index),
                            question: question_index + 1,
                            source,
                        })?;
                }
            }
        }

        Ok(Self {
            courses,
            lessons,
            quizzes,
        })
    }

    /// Parses a bundled catalog document.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed JSON and the validation
    /// errors of [`Catalog::new`].
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(raw)?;
        Self::new(doc.courses, doc.lessons, doc.quizzes)
    }

    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    #[must_use]
    pub fn course(&self, id: &CourseId) -> Option<&Course> {
        self.courses.iter().find(|c| &c.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Courses whose title contains `query`, case-insensitively, in catalog order.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Course> {
        let needle = query.trim().to_lowercase();
        self.courses
            .iter()
            .filter(|c| c.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Number of lesson content blocks for the course.
    #[must_use]
    pub fn lesson_count(&self, id: &CourseId) -> usize {
        self.lessons.get(id).map_or(0, Vec::len)
    }

    /// Looks up a lesson by its 1-based slot.
    #[must_use]
    pub fn lesson(&self, id: &CourseId, slot: LessonSlot) -> Option<Lesson<'_>> {
        let lessons = self.lessons.get(id)?;
        lessons.get(slot.index()).map(|markdown| Lesson {
            slot,
            total: lessons.len(),
            markdown,
        })
    }

    /// All lessons of a course in order.
    #[must_use]
    pub fn lessons(&self, id: &CourseId) -> Vec<Lesson<'_>> {
        let Some(lessons) = self.lessons.get(id) else {
            return Vec::new();
        };
        lessons
            .iter()
            .enumerate()
            .map(|(index, markdown)| Lesson {
                slot: LessonSlot::from_index(index),
                total: lessons.len(),
                markdown,
            })
            .collect()
    }

    /// Questions for the lesson's quiz. Missing quizzes yield an empty slice.
    #[must_use]
    pub fn quiz(&self, id: &CourseId, slot: LessonSlot) -> &[Question] {
        self.quizzes
            .get(id)
            .and_then(|sets| sets.get(slot.index()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of quiz slots registered for the course, never less than 1.
    ///
    /// This is the denominator of the completion percentage, so an unknown
    /// course counts as a single slot.
    #[must_use]
    pub fn total_lessons(&self, id: &CourseId) -> usize {
        self.quizzes.get(id).map_or(0, Vec::len).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> CourseId {
        CourseId::new(raw).unwrap()
    }

    fn slot(n: u32) -> LessonSlot {
        LessonSlot::new(n).unwrap()
    }

    const SAMPLE: &str = r###"{
        "courses": [
            { "id": "js-basics", "title": "JavaScript Basics" },
            { "id": "py-intro", "title": "Python 101" }
        ],
        "lessons": {
            "js-basics": ["# JavaScript Basics\n\nIntro.", "Plain text first\nmore", "## `let` and const"]
        },
        "quizzes": {
            "js-basics": [
                [{ "prompt": "Pick one", "options": ["a", "b"], "answerIndex": 1 }],
                []
            ]
        }
    }"###;

    #[test]
    fn parses_bundled_shape() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.courses()[0].title(), "JavaScript Basics");
        assert_eq!(catalog.lesson_count(&id("js-basics")), 3);
        assert_eq!(catalog.quiz(&id("js-basics"), slot(1)).len(), 1);
        assert!(catalog.quiz(&id("js-basics"), slot(1))[0].is_correct(1));
    }

    #[test]
    fn missing_quiz_is_empty() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert!(catalog.quiz(&id("js-basics"), slot(2)).is_empty());
        assert!(catalog.quiz(&id("js-basics"), slot(9)).is_empty());
        assert!(catalog.quiz(&id("py-intro"), slot(1)).is_empty());
    }

    #[test]
    fn total_lessons_counts_quiz_slots_and_floors_at_one() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.total_lessons(&id("js-basics")), 2);
        assert_eq!(catalog.total_lessons(&id("py-intro")), 1);
        assert_eq!(catalog.total_lessons(&id("unknown")), 1);
    }

    #[test]
    fn lesson_titles_come_from_first_heading() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let lessons = catalog.lessons(&id("js-basics"));
        assert_eq!(lessons[0].title(), "JavaScript Basics");
        assert_eq!(lessons[1].title(), "Plain text first");
        assert_eq!(lessons[2].title(), "let and const");
    }

    #[test]
    fn lesson_navigation_flags() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let first = catalog.lesson(&id("js-basics"), slot(1)).unwrap();
        let last = catalog.lesson(&id("js-basics"), slot(3)).unwrap();
        assert!(first.is_first());
        assert!(!first.is_last());
        assert!(last.is_last());
        assert!((last.reading_progress() - 1.0).abs() < f64::EPSILON);
        assert!(catalog.lesson(&id("js-basics"), slot(4)).is_none());
    }

    #[test]
    fn search_is_case_insensitive_and_trimmed() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let hits = catalog.search("  PYTHON ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id().as_str(), "py-intro");
        assert_eq!(catalog.search("").len(), 2);
    }

    #[test]
    fn rejects_duplicate_courses() {
        let raw = r#"{ "courses": [
            { "id": "a", "title": "A" },
            { "id": "a", "title": "Again" }
        ] }"#;
        assert!(matches!(
            Catalog::from_json(raw),
            Err(CatalogError::DuplicateCourse { .. })
        ));
    }

    #[test]
    fn rejects_answer_outside_options() {
        let raw = r#"{ "courses": [{ "id": "a", "title": "A" }],
            "quizzes": { "a": [[{ "prompt": "Q", "options": ["x"], "answerIndex": 3 }]] } }"#;
        let err = Catalog::from_json(raw).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidQuestion {
                source: QuestionError::AnswerOutOfRange { index: 3, len: 1 },
                ..
            }
        ));
    }

    #[test]
    fn question_constructor_validates() {
        assert_eq!(
            Question::new(" ", vec!["a".into()], 0).unwrap_err(),
            QuestionError::EmptyPrompt
        );
        assert_eq!(
            Question::new("Q", Vec::new(), 0).unwrap_err(),
            QuestionError::NoOptions
        );
    }
}
