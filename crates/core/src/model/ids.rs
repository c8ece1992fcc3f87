use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseIdError {
    #[error("course id cannot be empty")]
    Empty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonSlotError {
    #[error("lesson slots start at 1")]
    Zero,

    #[error("invalid lesson slot: {raw}")]
    Invalid { raw: String },
}

/// Identifier of a course track (for example `js-basics`).
///
/// Ids are trimmed and non-empty. They double as the key in the persisted
/// progress map, so they serialize as plain strings.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseId(String);

impl CourseId {
    /// Creates a validated `CourseId`.
    ///
    /// # Errors
    ///
    /// Returns `CourseIdError::Empty` if the id is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, CourseIdError> {
        let raw = id.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CourseIdError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CourseId {
    type Error = CourseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CourseId> for String {
    fn from(id: CourseId) -> Self {
        id.0
    }
}

impl FromStr for CourseId {
    type Err = CourseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// 1-based position of a lesson inside its course.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LessonSlot(u32);

impl LessonSlot {
    /// Creates a `LessonSlot` from its 1-based number.
    ///
    /// # Errors
    ///
    /// Returns `LessonSlotError::Zero` for slot 0.
    pub fn new(number: u32) -> Result<Self, LessonSlotError> {
        if number == 0 {
            return Err(LessonSlotError::Zero);
        }
        Ok(Self(number))
    }

    /// Builds the slot for a 0-based lesson index.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX - 1) + 1)
    }

    /// Returns the underlying 1-based number.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Returns the 0-based index into the course's lesson list.
    #[must_use]
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl FromStr for LessonSlot {
    type Err = LessonSlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number: u32 = s.trim().parse().map_err(|_| LessonSlotError::Invalid {
            raw: s.to_string(),
        })?;
        Self::new(number)
    }
}

impl fmt::Debug for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CourseId({})", self.0)
    }
}

impl fmt::Debug for LessonSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonSlot({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LessonSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
