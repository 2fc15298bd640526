use std::sync::Arc;

use hanzi_core::GameRules;
use storage::repository::Storage;

use crate::Clock;
use crate::achievement_service::AchievementService;
use crate::character_service::CharacterService;
use crate::error::AppServicesError;
use crate::game::GameLoopService;
use crate::progress_service::ProgressService;
use crate::stats_service::StatsService;
use crate::sync_service::SyncService;
use crate::user_service::UserService;

/// Assembles app-facing services over one `Storage`.
#[derive(Clone)]
pub struct AppServices {
    rules: GameRules,
    users: Arc<UserService>,
    progress: Arc<ProgressService>,
    achievements: Arc<AchievementService>,
    characters: Arc<CharacterService>,
    game_loop: Arc<GameLoopService>,
    stats: Arc<StatsService>,
    sync: Arc<SyncService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        rules: GameRules,
        characters: CharacterService,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, rules, characters))
    }

    /// Build services over an existing storage, e.g. `Storage::in_memory()`.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        rules: GameRules,
        characters: CharacterService,
    ) -> Self {
        let users = Arc::new(UserService::new(
            clock,
            rules.clone(),
            Arc::clone(&storage.users),
        ));
        let progress = Arc::new(ProgressService::new(
            clock,
            rules.clone(),
            Arc::clone(&storage.progress),
        ));
        let achievements = Arc::new(AchievementService::new(Arc::clone(&storage.achievements)));
        let characters = Arc::new(characters);
        let game_loop = Arc::new(GameLoopService::new(
            clock,
            rules.clone(),
            Arc::clone(&users),
            Arc::clone(&progress),
            Arc::clone(&achievements),
            Arc::clone(&characters),
            Arc::clone(&storage.sessions),
        ));
        let stats = Arc::new(StatsService::new(
            Arc::clone(&storage.progress),
            Arc::clone(&storage.sessions),
        ));
        let sync = Arc::new(SyncService::new(
            Arc::clone(&storage.users),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.achievements),
        ));

        Self {
            rules,
            users,
            progress,
            achievements,
            characters,
            game_loop,
            stats,
            sync,
        }
    }

    #[must_use]
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn achievements(&self) -> Arc<AchievementService> {
        Arc::clone(&self.achievements)
    }

    #[must_use]
    pub fn characters(&self) -> Arc<CharacterService> {
        Arc::clone(&self.characters)
    }

    #[must_use]
    pub fn game_loop(&self) -> Arc<GameLoopService> {
        Arc::clone(&self.game_loop)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn sync(&self) -> Arc<SyncService> {
        Arc::clone(&self.sync)
    }
}
