use std::sync::Arc;

use log::debug;

use codeclimb_core::model::{CourseId, LessonSlot};
use storage::KeyValueStore;
use storage::keys;
use storage::repository::StorageError;

/// Free-form learner notes, one per lesson slot.
#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn KeyValueStore>,
}

impl NoteService {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The saved note, or an empty string if none was written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn load(&self, course: &CourseId, slot: LessonSlot) -> Result<String, StorageError> {
        let note = self.store.get(&keys::note(course, slot)).await?;
        Ok(note.unwrap_or_default())
    }

    /// Overwrite the note for a lesson slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn save(
        &self,
        course: &CourseId,
        slot: LessonSlot,
        text: &str,
    ) -> Result<(), StorageError> {
        self.store.set(&keys::note(course, slot), text).await?;
        debug!("saved note for lesson {slot} of {course} ({} bytes)", text.len());
        Ok(())
    }
}
