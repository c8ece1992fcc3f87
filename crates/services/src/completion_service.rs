use std::sync::Arc;

use log::debug;

use codeclimb_core::model::{CompletedLessons, CourseId, LessonSlot};
use storage::json::{load_json, save_json};
use storage::keys;
use storage::repository::StorageError;
use storage::{KeyLocks, KeyValueStore};

/// Tracks which lessons of a course have a finished quiz.
#[derive(Clone)]
pub struct CompletionService {
    store: Arc<dyn KeyValueStore>,
    locks: KeyLocks,
}

impl CompletionService {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, locks: KeyLocks) -> Self {
        Self { store, locks }
    }

    /// Completed lessons of a course (empty if none or unreadable).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn load(&self, course: &CourseId) -> Result<CompletedLessons, StorageError> {
        load_json(self.store.as_ref(), &keys::completed_lessons(course)).await
    }

    /// Mark a lesson completed. Returns `false` if it already was.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if reading or writing fails.
    pub async fn mark(&self, course: &CourseId, slot: LessonSlot) -> Result<bool, StorageError> {
        let key = keys::completed_lessons(course);
        let _guard = self.locks.lock(&key).await;

        let mut completed: CompletedLessons = load_json(self.store.as_ref(), &key).await?;
        if !completed.mark(slot) {
            return Ok(false);
        }
        save_json(self.store.as_ref(), &key, &completed).await?;
        debug!("lesson {slot} of {course} marked completed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::InMemoryStore;

    #[tokio::test]
    async fn marks_are_persisted_once() {
        let store = InMemoryStore::new();
        let svc = CompletionService::new(Arc::new(store.clone()), KeyLocks::new());
        let course = CourseId::new("ds-algos").unwrap();
        let slot = LessonSlot::new(2).unwrap();

        assert!(svc.mark(&course, slot).await.unwrap());
        assert!(!svc.mark(&course, slot).await.unwrap());
        assert_eq!(
            store.get("completed-ds-algos").await.unwrap().as_deref(),
            Some("[1]")
        );
        assert!(svc.load(&course).await.unwrap().contains(slot));
    }
}
