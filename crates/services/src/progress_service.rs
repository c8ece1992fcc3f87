use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use codeclimb_core::model::{
    Catalog, CompletedLessons, Course, CourseId, CourseProgress, Percent, ProgressRule,
    completed_lessons_percent, overall_progress,
};
use storage::json::{load_json, save_json};
use storage::keys;
use storage::{KeyLocks, KeyValueStore};

use crate::error::ProgressServiceError;

/// A course row for the course list, with its stored percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseListItem {
    pub course: Course,
    pub percent: Percent,
}

/// Reads and updates the per-course completion percentages.
#[derive(Clone)]
pub struct ProgressService {
    store: Arc<dyn KeyValueStore>,
    locks: KeyLocks,
    catalog: Arc<Catalog>,
    rule: ProgressRule,
}

impl ProgressService {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, locks: KeyLocks, catalog: Arc<Catalog>) -> Self {
        Self {
            store,
            locks,
            catalog,
            rule: ProgressRule::default(),
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: ProgressRule) -> Self {
        self.rule = rule;
        self
    }

    #[must_use]
    pub fn rule(&self) -> ProgressRule {
        self.rule
    }

    /// Load the stored progress map. Missing or malformed data reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the store cannot be read.
    pub async fn load(&self) -> Result<CourseProgress, ProgressServiceError> {
        let progress = load_json(self.store.as_ref(), keys::COURSE_PROGRESS).await?;
        Ok(progress)
    }

    /// Stored percentage for one course (0 if absent).
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the store cannot be read.
    pub async fn percent(&self, course: &CourseId) -> Result<Percent, ProgressServiceError> {
        Ok(self.load().await?.get(course))
    }

    /// Recompute and persist a course's percentage after a finished quiz.
    ///
    /// With [`ProgressRule::StoredPercent`] the stored value is fed back into
    /// `round((stored + 1) / total * 100)`. With
    /// [`ProgressRule::CompletedLessons`] the value is derived from the
    /// course's completed-lesson set, which must already include the lesson
    /// just finished.
    ///
    /// The whole map is written back while the progress key is locked.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if reading or writing fails; the
    /// stored map is then unchanged.
    pub async fn record_quiz_completion(
        &self,
        course: &CourseId,
    ) -> Result<Percent, ProgressServiceError> {
        let _guard = self.locks.lock(keys::COURSE_PROGRESS).await;

        let mut progress = self.load().await?;
        let total = self.catalog.total_lessons(course);
        let next = match self.rule {
            ProgressRule::StoredPercent => progress.record_completion(course, total),
            ProgressRule::CompletedLessons => {
                let completed: CompletedLessons =
                    load_json(self.store.as_ref(), &keys::completed_lessons(course)).await?;
                let next = completed_lessons_percent(completed.len(), total);
                progress.set(course.clone(), next);
                next
            }
        };

        save_json(self.store.as_ref(), keys::COURSE_PROGRESS, &progress).await?;
        info!("course {course} progress now {next} ({} rule, {total} slots)", self.rule);
        Ok(next)
    }

    /// Mean progress across the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Progress` for an empty catalog, or
    /// `ProgressServiceError::Storage` if the store cannot be read.
    pub async fn overall(&self) -> Result<Percent, ProgressServiceError> {
        let progress = self.load().await?;
        Ok(overall_progress(&progress, &self.catalog)?)
    }

    /// Courses matching `query` with their stored percentages.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the store cannot be read.
    pub async fn course_list(
        &self,
        query: &str,
    ) -> Result<Vec<CourseListItem>, ProgressServiceError> {
        let progress = self.load().await?;
        let items: Vec<CourseListItem> = self
            .catalog
            .search(query)
            .into_iter()
            .map(|course| CourseListItem {
                course: course.clone(),
                percent: progress.get(course.id()),
            })
            .collect();
        debug!("course list for {query:?}: {} matches", items.len());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeclimb_core::model::{Course, LessonSlot, Question};
    use std::collections::HashMap;
    use storage::InMemoryStore;

    fn id(raw: &str) -> CourseId {
        CourseId::new(raw).unwrap()
    }

    fn quiz_sets(n: usize) -> Vec<Vec<Question>> {
        (0..n)
            .map(|_| vec![Question::new("Q", vec!["a".into(), "b".into()], 0).unwrap()])
            .collect()
    }

    fn catalog() -> Arc<Catalog> {
        let courses = vec![
            Course::new(id("four"), "Four Lessons"),
            Course::new(id("empty"), "No Quizzes"),
        ];
        let mut quizzes = HashMap::new();
        quizzes.insert(id("four"), quiz_sets(4));
        Arc::new(Catalog::new(courses, HashMap::new(), quizzes).unwrap())
    }

    fn service(store: &InMemoryStore) -> ProgressService {
        ProgressService::new(Arc::new(store.clone()), KeyLocks::new(), catalog())
    }

    #[tokio::test]
    async fn legacy_rule_jumps_then_clamps() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let course = id("four");

        assert_eq!(svc.record_quiz_completion(&course).await.unwrap().value(), 25);
        assert_eq!(
            store.get(keys::COURSE_PROGRESS).await.unwrap().as_deref(),
            Some(r#"{"four":25}"#)
        );
        assert_eq!(svc.record_quiz_completion(&course).await.unwrap().value(), 100);
        assert_eq!(svc.percent(&course).await.unwrap().value(), 100);
    }

    #[tokio::test]
    async fn course_without_quizzes_counts_as_one_slot() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        assert_eq!(
            svc.record_quiz_completion(&id("empty")).await.unwrap(),
            Percent::FULL
        );
    }

    #[tokio::test]
    async fn update_keeps_other_courses() {
        let store = InMemoryStore::with_entries([(keys::COURSE_PROGRESS, r#"{"empty":40}"#)]);
        let svc = service(&store);
        svc.record_quiz_completion(&id("four")).await.unwrap();
        let progress = svc.load().await.unwrap();
        assert_eq!(progress.get(&id("empty")).value(), 40);
        assert_eq!(progress.get(&id("four")).value(), 25);
    }

    #[tokio::test]
    async fn corrupted_map_restarts_from_empty() {
        let store = InMemoryStore::with_entries([(keys::COURSE_PROGRESS, "{oops")]);
        let svc = service(&store);
        assert!(svc.load().await.unwrap().is_empty());
        assert_eq!(svc.record_quiz_completion(&id("four")).await.unwrap().value(), 25);
    }

    #[tokio::test]
    async fn lessons_rule_is_idempotent_per_lesson() {
        let store = InMemoryStore::new();
        let svc = service(&store).with_rule(ProgressRule::CompletedLessons);
        let course = id("four");

        let mut done = CompletedLessons::new();
        done.mark(LessonSlot::new(1).unwrap());
        save_json(&store, &keys::completed_lessons(&course), &done)
            .await
            .unwrap();

        assert_eq!(svc.record_quiz_completion(&course).await.unwrap().value(), 25);
        assert_eq!(svc.record_quiz_completion(&course).await.unwrap().value(), 25);

        done.mark(LessonSlot::new(2).unwrap());
        save_json(&store, &keys::completed_lessons(&course), &done)
            .await
            .unwrap();
        assert_eq!(svc.record_quiz_completion(&course).await.unwrap().value(), 50);
    }

    #[tokio::test]
    async fn overall_averages_catalog() {
        let store = InMemoryStore::with_entries([(keys::COURSE_PROGRESS, r#"{"four":50}"#)]);
        let svc = service(&store);
        assert_eq!(svc.overall().await.unwrap().value(), 25);
    }

    #[tokio::test]
    async fn course_list_pairs_titles_with_percent() {
        let store = InMemoryStore::with_entries([(keys::COURSE_PROGRESS, r#"{"four":50}"#)]);
        let svc = service(&store);
        let items = svc.course_list("four").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].course.id(), &id("four"));
        assert_eq!(items[0].percent.value(), 50);
        assert_eq!(svc.course_list("").await.unwrap().len(), 2);
    }
}
