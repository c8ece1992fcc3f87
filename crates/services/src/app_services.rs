use std::sync::Arc;

use log::info;

use codeclimb_core::model::Catalog;
use storage::repository::Storage;

use crate::Clock;
use crate::bundled::bundled_catalog;
use crate::completion_service::CompletionService;
use crate::config::EngineConfig;
use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::note_service::NoteService;
use crate::progress_service::ProgressService;
use crate::quiz_flow::QuizFlowService;
use crate::streak_service::StreakService;

/// Assembles app-facing services over one store and catalog.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    progress: Arc<ProgressService>,
    streak: Arc<StreakService>,
    completion: Arc<CompletionService>,
    notes: Arc<NoteService>,
    quiz_flow: Arc<QuizFlowService>,
    dashboard: Arc<DashboardService>,
}

impl AppServices {
    /// Wire services over existing storage. All services share the storage's
    /// key locks.
    #[must_use]
    pub fn new(storage: &Storage, catalog: Arc<Catalog>, clock: Clock, config: EngineConfig) -> Self {
        let progress = ProgressService::new(
            Arc::clone(&storage.kv),
            storage.locks.clone(),
            Arc::clone(&catalog),
        )
        .with_rule(config.progress_rule);
        let streak = StreakService::new(clock, Arc::clone(&storage.kv), storage.locks.clone());
        let completion = CompletionService::new(Arc::clone(&storage.kv), storage.locks.clone());
        let notes = NoteService::new(Arc::clone(&storage.kv));

        let quiz_flow = QuizFlowService::new(
            Arc::clone(&catalog),
            progress.clone(),
            streak.clone(),
            completion.clone(),
        );
        let dashboard = DashboardService::new(
            Arc::clone(&catalog),
            progress.clone(),
            streak.clone(),
            completion.clone(),
            notes.clone(),
            config.activity_window,
        );

        Self {
            catalog,
            config,
            progress: Arc::new(progress),
            streak: Arc::new(streak),
            completion: Arc::new(completion),
            notes: Arc::new(notes),
            quiz_flow: Arc::new(quiz_flow),
            dashboard: Arc::new(dashboard),
        }
    }

    /// Build services backed by `SQLite` storage and the bundled catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the
    /// bundled catalog is invalid.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: EngineConfig,
    ) -> Result<Self, AppServicesError> {
        let catalog = Arc::new(bundled_catalog()?);
        let storage = Storage::sqlite(db_url).await?;
        info!(
            "opened {db_url} with {} courses ({} progress rule)",
            catalog.len(),
            config.progress_rule
        );
        Ok(Self::new(&storage, catalog, clock, config))
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn streak(&self) -> Arc<StreakService> {
        Arc::clone(&self.streak)
    }

    #[must_use]
    pub fn completion(&self) -> Arc<CompletionService> {
        Arc::clone(&self.completion)
    }

    #[must_use]
    pub fn notes(&self) -> Arc<NoteService> {
        Arc::clone(&self.notes)
    }

    #[must_use]
    pub fn quiz_flow(&self) -> Arc<QuizFlowService> {
        Arc::clone(&self.quiz_flow)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }
}
