use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of days shown in the recent-activity grid.
pub const DEFAULT_ACTIVITY_WINDOW: usize = 28;

const STUDY_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudyDateError {
    #[error("invalid study date (expected YYYY-MM-DD): {raw}")]
    Invalid { raw: String },
}

/// Parses a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns `StudyDateError::Invalid` if the string is not a calendar date.
pub fn parse_study_date(raw: &str) -> Result<NaiveDate, StudyDateError> {
    NaiveDate::parse_from_str(raw.trim(), STUDY_DATE_FORMAT).map_err(|_| StudyDateError::Invalid {
        raw: raw.to_string(),
    })
}

#[must_use]
pub fn format_study_date(date: NaiveDate) -> String {
    date.format(STUDY_DATE_FORMAT).to_string()
}

/// Days on which the learner finished at least one quiz.
///
/// Persisted as an array of `YYYY-MM-DD` strings. Entries that do not parse
/// are dropped on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct StudyDates(BTreeSet<NaiveDate>);

impl StudyDates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a day; returns `false` if it was already recorded.
    pub fn insert(&mut self, day: NaiveDate) -> bool {
        self.0.insert(day)
    }

    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.0.contains(&day)
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

impl FromIterator<NaiveDate> for StudyDates {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<String>> for StudyDates {
    fn from(raw: Vec<String>) -> Self {
        raw.iter()
            .filter_map(|s| match parse_study_date(s) {
                Ok(day) => Some(day),
                Err(err) => {
                    warn!("skipping stored study date: {err}");
                    None
                }
            })
            .collect()
    }
}

impl From<StudyDates> for Vec<String> {
    fn from(dates: StudyDates) -> Self {
        dates.0.into_iter().map(format_study_date).collect()
    }
}

/// Consecutive studied days ending at `today`.
///
/// Returns 0 when `today` itself was not studied, even if yesterday closed a
/// long run: the streak is the current one, not the best one.
#[must_use]
pub fn compute_streak(dates: &StudyDates, today: NaiveDate) -> u32 {
    let mut count = 0_u32;
    let mut cursor = Some(today);
    while let Some(day) = cursor {
        if !dates.contains(day) {
            break;
        }
        count += 1;
        cursor = day.pred_opt();
    }
    count
}

/// One cell of the recent-activity grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub studied: bool,
}

/// The `days` calendar dates ending at `today`, oldest first.
#[must_use]
pub fn recent_activity_window(dates: &StudyDates, today: NaiveDate, days: usize) -> Vec<ActivityDay> {
    let mut window: Vec<ActivityDay> = (0..days)
        .map_while(|offset| today.checked_sub_days(Days::new(offset as u64)))
        .map(|date| ActivityDay {
            date,
            studied: dates.contains(date),
        })
        .collect();
    window.reverse();
    window
}

/// Home-screen label for a streak: `--`, `1 Day`, `N Days`.
#[must_use]
pub fn describe_streak(streak: u32) -> String {
    match streak {
        0 => "--".to_string(),
        1 => "1 Day".to_string(),
        n => format!("{n} Days"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(raw: &str) -> NaiveDate {
        parse_study_date(raw).unwrap()
    }

    fn dates(raw: &[&str]) -> StudyDates {
        raw.iter().map(|s| day(s)).collect()
    }

    #[test]
    fn contiguous_run_ending_today() {
        let studied = dates(&["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(compute_streak(&studied, day("2024-01-03")), 3);
    }

    #[test]
    fn missing_today_breaks_the_streak() {
        let studied = dates(&["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(compute_streak(&studied, day("2024-01-05")), 0);
        assert_eq!(compute_streak(&studied, day("2024-01-04")), 0);
    }

    #[test]
    fn gap_stops_the_walk() {
        let studied = dates(&["2024-01-01", "2024-01-03"]);
        assert_eq!(compute_streak(&studied, day("2024-01-03")), 1);
    }

    #[test]
    fn streak_crosses_month_and_leap_day() {
        let studied = dates(&["2024-02-28", "2024-02-29", "2024-03-01"]);
        assert_eq!(compute_streak(&studied, day("2024-03-01")), 3);
    }

    #[test]
    fn empty_history_has_no_streak() {
        assert_eq!(compute_streak(&StudyDates::new(), day("2024-01-01")), 0);
    }

    #[test]
    fn window_lists_days_oldest_first() {
        let studied = dates(&["2024-01-07", "2024-01-10", "2023-12-31"]);
        let window = recent_activity_window(&studied, day("2024-01-10"), 5);
        let days: Vec<String> = window.iter().map(|d| format_study_date(d.date)).collect();
        assert_eq!(
            days,
            ["2024-01-06", "2024-01-07", "2024-01-08", "2024-01-09", "2024-01-10"]
        );
        let flags: Vec<bool> = window.iter().map(|d| d.studied).collect();
        assert_eq!(flags, [false, true, false, false, true]);
    }

    #[test]
    fn default_window_is_four_weeks() {
        let window = recent_activity_window(&StudyDates::new(), day("2024-03-01"), DEFAULT_ACTIVITY_WINDOW);
        assert_eq!(window.len(), 28);
        assert_eq!(window[0].date, day("2024-02-03"));
        assert!(window.iter().all(|d| !d.studied));
        assert!(recent_activity_window(&StudyDates::new(), day("2024-03-01"), 0).is_empty());
    }

    #[test]
    fn window_stops_at_the_earliest_representable_day() {
        let today = NaiveDate::MIN.checked_add_days(Days::new(2)).unwrap();
        let window = recent_activity_window(&StudyDates::new(), today, usize::MAX);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].date, NaiveDate::MIN);
        assert_eq!(window[2].date, today);
    }

    #[test]
    fn insert_reports_duplicates() {
        let mut studied = StudyDates::new();
        assert!(studied.insert(day("2024-01-01")));
        assert!(!studied.insert(day("2024-01-01")));
        assert_eq!(studied.len(), 1);
    }

    #[test]
    fn persisted_shape_is_a_sorted_string_array() {
        let studied = dates(&["2024-01-03", "2024-01-01"]);
        let json = serde_json::to_string(&studied).unwrap();
        assert_eq!(json, r#"["2024-01-01","2024-01-03"]"#);
    }

    #[test]
    fn load_drops_bad_and_duplicate_entries() {
        let read: StudyDates =
            serde_json::from_str(r#"["2024-01-01","not a date","2024-01-01","2024-02-30"]"#).unwrap();
        assert_eq!(read, dates(&["2024-01-01"]));
    }

    #[test]
    fn streak_labels() {
        assert_eq!(describe_streak(0), "--");
        assert_eq!(describe_streak(1), "1 Day");
        assert_eq!(describe_streak(12), "12 Days");
    }
}
