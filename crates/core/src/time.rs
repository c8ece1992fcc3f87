use chrono::{Days, Local, NaiveDate};

/// Source of the learner's current calendar day.
///
/// Streaks and study days are tracked per local calendar day, so the clock
/// only ever answers "what day is it".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// The device's local time zone.
    #[default]
    Local,
    /// A pinned day, for tests and for replaying activity.
    Pinned(NaiveDate),
}

impl Clock {
    #[must_use]
    pub fn local() -> Self {
        Self::Local
    }

    #[must_use]
    pub fn on_day(day: NaiveDate) -> Self {
        Self::Pinned(day)
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::Local => Local::now().date_naive(),
            Clock::Pinned(day) => *day,
        }
    }

    /// Moves a pinned clock forward by whole days. No effect on `Clock::Local`.
    pub fn advance_days(&mut self, days: u64) {
        if let Clock::Pinned(day) = self {
            *day = day.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
        }
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Clock::Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_clock_reports_its_day() {
        let day = NaiveDate::from_ymd_opt(2023, 11, 14).unwrap();
        assert_eq!(Clock::on_day(day).today(), day);
        assert!(!Clock::on_day(day).is_local());
    }

    #[test]
    fn advancing_rolls_over_month_end() {
        let mut clock = Clock::on_day(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        clock.advance_days(1);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn local_clock_ignores_advance() {
        let mut clock = Clock::local();
        clock.advance_days(3);
        assert!(clock.is_local());
        assert_eq!(clock, Clock::default());
    }
}
