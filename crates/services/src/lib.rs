#![forbid(unsafe_code)]

pub mod achievement_service;
pub mod app_services;
pub mod character_service;
pub mod error;
pub mod game;
pub mod progress_service;
pub mod stats_service;
pub mod sync_service;
pub mod user_service;

pub use hanzi_core::Clock;

pub use error::{
    AchievementServiceError, AppServicesError, GameError, SessionError, UserServiceError,
};

pub use achievement_service::AchievementService;
pub use app_services::AppServices;
pub use character_service::CharacterService;
pub use game::{
    AnswerOutcome, GameAnswerResult, GameLoopService, GameOptions, GamePhase, GameProgress,
    GameResults, GameSession,
};
pub use progress_service::ProgressService;
pub use stats_service::{StatsService, UserStats};
pub use sync_service::{SyncService, UserSnapshot};
pub use user_service::{ExperienceGain, UserService};
