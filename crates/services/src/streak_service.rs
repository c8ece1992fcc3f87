use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info};

use codeclimb_core::model::{
    ActivityDay, StudyDates, compute_streak, format_study_date, recent_activity_window,
};
use storage::json::{load_json, save_json};
use storage::keys;
use storage::{KeyLocks, KeyValueStore};

use crate::Clock;
use crate::error::StreakServiceError;

/// Records study days and derives the current streak from them.
#[derive(Clone)]
pub struct StreakService {
    clock: Clock,
    store: Arc<dyn KeyValueStore>,
    locks: KeyLocks,
}

impl StreakService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn KeyValueStore>, locks: KeyLocks) -> Self {
        Self {
            clock,
            store,
            locks,
        }
    }

    /// The learner's current calendar day.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Load recorded study days. Missing or malformed data reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `StreakServiceError::Storage` if the store cannot be read.
    pub async fn load(&self) -> Result<StudyDates, StreakServiceError> {
        let dates = load_json(self.store.as_ref(), keys::STUDY_DATES).await?;
        Ok(dates)
    }

    /// Add `day` to the study days if it is not there yet.
    ///
    /// Returns `true` when the day was newly recorded. Repeat calls for the
    /// same day do not write.
    ///
    /// # Errors
    ///
    /// Returns `StreakServiceError::Storage` if reading or writing fails.
    pub async fn record_study_activity(&self, day: NaiveDate) -> Result<bool, StreakServiceError> {
        let _guard = self.locks.lock(keys::STUDY_DATES).await;

        let mut dates = self.load().await?;
        if !dates.insert(day) {
            debug!("study day {} already recorded", format_study_date(day));
            return Ok(false);
        }
        save_json(self.store.as_ref(), keys::STUDY_DATES, &dates).await?;
        info!(
            "recorded study day {} ({} days total)",
            format_study_date(day),
            dates.len()
        );
        Ok(true)
    }

    /// Record activity for the clock's current day.
    ///
    /// # Errors
    ///
    /// Returns `StreakServiceError::Storage` if reading or writing fails.
    pub async fn record_today(&self) -> Result<bool, StreakServiceError> {
        self.record_study_activity(self.today()).await
    }

    /// Consecutive studied days ending today.
    ///
    /// # Errors
    ///
    /// Returns `StreakServiceError::Storage` if the store cannot be read.
    pub async fn current_streak(&self) -> Result<u32, StreakServiceError> {
        let dates = self.load().await?;
        Ok(compute_streak(&dates, self.today()))
    }

    /// The last `days` calendar days, oldest first, flagged by activity.
    ///
    /// # Errors
    ///
    /// Returns `StreakServiceError::Storage` if the store cannot be read.
    pub async fn activity_window(&self, days: usize) -> Result<Vec<ActivityDay>, StreakServiceError> {
        let dates = self.load().await?;
        Ok(recent_activity_window(&dates, self.today(), days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeclimb_core::model::parse_study_date;
    use storage::InMemoryStore;

    fn day(raw: &str) -> NaiveDate {
        parse_study_date(raw).unwrap()
    }

    fn service(store: &InMemoryStore, today: &str) -> StreakService {
        StreakService::new(
            Clock::on_day(day(today)),
            Arc::new(store.clone()),
            KeyLocks::new(),
        )
    }

    #[tokio::test]
    async fn recording_the_same_day_twice_is_a_no_op() {
        let store = InMemoryStore::new();
        let svc = service(&store, "2024-01-03");

        assert!(svc.record_today().await.unwrap());
        let after_first = store.get(keys::STUDY_DATES).await.unwrap();
        assert!(!svc.record_today().await.unwrap());
        let after_second = store.get(keys::STUDY_DATES).await.unwrap();

        assert_eq!(after_first.as_deref(), Some(r#"["2024-01-03"]"#));
        assert_eq!(after_first, after_second);
        assert_eq!(svc.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn keeps_dates_written_by_older_installs() {
        let store = InMemoryStore::with_entries([(
            keys::STUDY_DATES,
            r#"["2024-01-02","2024-01-01"]"#,
        )]);
        let svc = service(&store, "2024-01-03");
        svc.record_today().await.unwrap();
        assert_eq!(svc.current_streak().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn streak_follows_the_clock() {
        let store = InMemoryStore::new();
        let mut clock = Clock::on_day(day("2024-01-01"));
        for _ in 0..3 {
            let svc = StreakService::new(clock, Arc::new(store.clone()), KeyLocks::new());
            svc.record_today().await.unwrap();
            clock.advance_days(1);
        }

        let next_day = StreakService::new(clock, Arc::new(store.clone()), KeyLocks::new());
        assert_eq!(next_day.today(), day("2024-01-04"));
        assert_eq!(next_day.current_streak().await.unwrap(), 0);
        next_day.record_today().await.unwrap();
        assert_eq!(next_day.current_streak().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn corrupted_dates_read_as_empty() {
        let store = InMemoryStore::with_entries([(keys::STUDY_DATES, "not json")]);
        let svc = service(&store, "2024-01-03");
        assert!(svc.load().await.unwrap().is_empty());
        assert!(svc.record_today().await.unwrap());
    }

    #[tokio::test]
    async fn window_ends_today() {
        let store = InMemoryStore::with_entries([(keys::STUDY_DATES, r#"["2024-01-07"]"#)]);
        let svc = service(&store, "2024-01-10");
        let window = svc.activity_window(5).await.unwrap();
        assert_eq!(window.len(), 5);
        assert_eq!(window[0].date, day("2024-01-06"));
        assert!(window[1].studied);
        assert_eq!(window[4].date, day("2024-01-10"));
    }
}
