use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::catalog::Catalog;
use crate::model::ids::CourseId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("overall progress needs at least one course in the catalog")]
    EmptyCatalog,

    #[error("unknown progress rule: {raw} (expected `legacy` or `lessons`)")]
    UnknownRule { raw: String },
}

/// Integer completion percentage, always within `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Percent(u8);

impl Percent {
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(100);

    /// Clamps any integer into `0..=100`.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        let bounded = value.clamp(0, 100);
        Self(u8::try_from(bounded).unwrap_or(100))
    }

    /// Rounds `numerator / denominator * 100` half-up and clamps it.
    ///
    /// A zero denominator is treated as 1.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn from_ratio(numerator: f64, denominator: usize) -> Self {
        let denominator = denominator.max(1) as f64;
        let raw = (numerator / denominator * 100.0).round();
        if raw.is_nan() {
            return Self::ZERO;
        }
        Self::clamped(raw.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl From<i64> for Percent {
    fn from(value: i64) -> Self {
        Self::clamped(value)
    }
}

impl From<Percent> for u8 {
    fn from(p: Percent) -> Self {
        p.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// How a finished quiz moves a course's percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressRule {
    /// Feeds the stored percentage back in as if it were a lesson count:
    /// `round((stored + 1) / total * 100)`. Grows superlinearly and is not
    /// idempotent, but matches what existing installs have persisted.
    #[default]
    StoredPercent,
    /// Percentage of distinct lessons completed.
    CompletedLessons,
}

impl FromStr for ProgressRule {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "stored-percent" => Ok(Self::StoredPercent),
            "lessons" | "completed-lessons" => Ok(Self::CompletedLessons),
            _ => Err(ProgressError::UnknownRule { raw: s.to_string() }),
        }
    }
}

impl fmt::Display for ProgressRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressRule::StoredPercent => f.write_str("legacy"),
            ProgressRule::CompletedLessons => f.write_str("lessons"),
        }
    }
}

/// Next percentage under [`ProgressRule::StoredPercent`].
#[must_use]
pub fn next_stored_percent(prior: Percent, total_lessons: usize) -> Percent {
    Percent::from_ratio(f64::from(prior.value()) + 1.0, total_lessons)
}

/// Percentage under [`ProgressRule::CompletedLessons`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completed_lessons_percent(completed: usize, total_lessons: usize) -> Percent {
    Percent::from_ratio(completed as f64, total_lessons)
}

/// Persisted map of course id to completion percentage.
///
/// Courses without an entry read as 0%.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseProgress(BTreeMap<CourseId, Percent>);

impl CourseProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, course: &CourseId) -> Percent {
        self.0.get(course).copied().unwrap_or_default()
    }

    pub fn set(&mut self, course: CourseId, percent: Percent) {
        self.0.insert(course, percent);
    }

    /// Applies one quiz completion under the stored-percent rule and returns
    /// the new value.
    pub fn record_completion(&mut self, course: &CourseId, total_lessons: usize) -> Percent {
        let next = next_stored_percent(self.get(course), total_lessons);
        self.0.insert(course.clone(), next);
        next
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Mean percentage over every course in the catalog, rounded.
///
/// Courses missing from `progress` count as 0%; entries for courses the
/// catalog does not list are ignored.
///
/// # Errors
///
/// Returns `ProgressError::EmptyCatalog` when the catalog has no courses.
pub fn overall_progress(progress: &CourseProgress, catalog: &Catalog) -> Result<Percent, ProgressError> {
    if catalog.is_empty() {
        return Err(ProgressError::EmptyCatalog);
    }
    let sum: u32 = catalog
        .courses()
        .iter()
        .map(|c| u32::from(progress.get(c.id()).value()))
        .sum();
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let mean = (f64::from(sum) / catalog.len() as f64).round() as i64;
    Ok(Percent::clamped(mean))
}

/// Home-screen label for the overall percentage.
#[must_use]
pub fn describe_overall(percent: Percent) -> String {
    if percent.value() > 0 {
        format!("{}% Complete", percent.value())
    } else {
        "--".to_string()
    }
}
