#![forbid(unsafe_code)]

pub mod app_services;
pub mod bundled;
pub mod completion_service;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod note_service;
pub mod progress_service;
pub mod quiz_flow;
pub mod streak_service;

pub use codeclimb_core::Clock;

pub use app_services::AppServices;
pub use bundled::bundled_catalog;
pub use completion_service::CompletionService;
pub use config::EngineConfig;
pub use dashboard::{CourseDetail, Dashboard, DashboardService, LessonRow, LessonView};
pub use error::{
    AppServicesError, DashboardError, ProgressServiceError, QuizFlowError, StreakServiceError,
};
pub use note_service::NoteService;
pub use progress_service::{CourseListItem, ProgressService};
pub use quiz_flow::{QuizCompletion, QuizFlowService};
pub use streak_service::StreakService;
