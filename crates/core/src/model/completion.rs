use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::ids::LessonSlot;

/// Lessons of one course whose quiz has been finished.
///
/// Persisted as an array of 0-based lesson indices, which is what the
/// course-detail list checks against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletedLessons(BTreeSet<usize>);

impl CompletedLessons {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a lesson; returns `false` if it was already completed.
    pub fn mark(&mut self, slot: LessonSlot) -> bool {
        self.0.insert(slot.index())
    }

    #[must_use]
    pub fn contains(&self, slot: LessonSlot) -> bool {
        self.0.contains(&slot.index())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_zero_based_indices() {
        let mut done = CompletedLessons::new();
        assert!(done.mark(LessonSlot::new(1).unwrap()));
        assert!(done.mark(LessonSlot::new(3).unwrap()));
        assert!(!done.mark(LessonSlot::new(3).unwrap()));
        assert_eq!(serde_json::to_string(&done).unwrap(), "[0,2]");
    }

    #[test]
    fn reads_legacy_arrays_with_duplicates() {
        let done: CompletedLessons = serde_json::from_str("[1,1,0]").unwrap();
        assert_eq!(done.len(), 2);
        assert!(done.contains(LessonSlot::new(2).unwrap()));
    }
}
