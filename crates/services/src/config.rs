use codeclimb_core::model::{DEFAULT_ACTIVITY_WINDOW, ProgressRule};

/// Tunables shared by the progress and streak services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub progress_rule: ProgressRule,
    pub activity_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            progress_rule: ProgressRule::StoredPercent,
            activity_window: DEFAULT_ACTIVITY_WINDOW,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_progress_rule(mut self, rule: ProgressRule) -> Self {
        self.progress_rule = rule;
        self
    }

    #[must_use]
    pub fn with_activity_window(mut self, days: usize) -> Self {
        self.activity_window = days;
        self
    }
}
