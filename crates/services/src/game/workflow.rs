use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

use hanzi_core::GameRules;
use hanzi_core::achievements::{AchievementContext, streak_days};
use hanzi_core::model::{Achievement, Category, GameSessionId, UserId, UserProgress};
use hanzi_core::selection::SelectionOptions;
use storage::repository::GameSessionRepository;

use super::progress::{AnswerOutcome, PendingAnswer};
use super::session::GameSession;
use crate::Clock;
use crate::achievement_service::AchievementService;
use crate::character_service::CharacterService;
use crate::error::{GameError, SessionError};
use crate::progress_service::ProgressService;
use crate::user_service::{ExperienceGain, UserService};

/// Days of completed games scanned for the daily streak.
const STREAK_WINDOW_DAYS: i64 = 366;

/// Knobs for starting a game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameOptions {
    /// Number of questions; defaults to the rules' session size.
    pub count: Option<usize>,
    pub category: Option<Category>,
    /// Leave out characters the user has already mastered.
    pub skip_mastered: bool,
}

/// Result of answering one question through the game loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameAnswerResult {
    pub outcome: AnswerOutcome,
    pub progress: UserProgress,
    pub experience: Option<ExperienceGain>,
    pub unlocked: Vec<Achievement>,
    pub is_complete: bool,
    pub record_id: Option<GameSessionId>,
}

/// Orchestrates game start, persisted answering and completion.
#[derive(Clone)]
pub struct GameLoopService {
    clock: Clock,
    rules: GameRules,
    users: Arc<UserService>,
    progress: Arc<ProgressService>,
    achievements: Arc<AchievementService>,
    characters: Arc<CharacterService>,
    sessions: Arc<dyn GameSessionRepository>,
}

impl GameLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        rules: GameRules,
        users: Arc<UserService>,
        progress: Arc<ProgressService>,
        achievements: Arc<AchievementService>,
        characters: Arc<CharacterService>,
        sessions: Arc<dyn GameSessionRepository>,
    ) -> Self {
        Self {
            clock,
            rules,
            users,
            progress,
            achievements,
            characters,
            sessions,
        }
    }

    /// Pick characters for the user's level and open a game.
    ///
    /// # Errors
    ///
    /// Returns `GameError::User` if the user does not exist.
    /// Returns `GameError::Session` with `SessionError::Empty` when nothing
    /// is left to play (for example, every candidate is mastered).
    pub async fn start_game(
        &self,
        user_id: &UserId,
        options: &GameOptions,
    ) -> Result<GameSession, GameError> {
        let user = self.users.get_user(user_id).await?;
        let mut selection = SelectionOptions::for_level(user.level)
            .with_count(options.count.unwrap_or(self.rules.questions_per_session))
            .with_category(options.category);
        if options.skip_mastered {
            selection = selection.excluding(self.progress.mastered_ids(user_id).await?);
        }

        let characters = self.characters.select_for_user(&selection);
        let questions = self
            .characters
            .questions_for(characters, self.rules.options_per_question);

        let mut session = GameSession::new(user_id.clone(), self.rules.clone());
        session.start(questions, self.clock.now())?;
        tracing::info!(
            user_id = %user_id,
            level = user.level,
            questions = session.progress().total,
            "game started"
        );
        Ok(session)
    }

    /// Answer the current question, then persist progress and experience.
    ///
    /// The session only advances once progress and experience are stored.
    /// The final answer also stores the game record and checks the
    /// per-session achievements. When a write fails the answer stays
    /// pending on the session; calling again with the same option resumes
    /// the remaining writes without repeating the ones that succeeded.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Session` for answers the session rejects,
    /// including `SessionError::AnswerPending` for a different option while
    /// an answer is pending.
    /// Returns other `GameError` variants when persistence fails.
    pub async fn answer_current(
        &self,
        session: &mut GameSession,
        option: &str,
    ) -> Result<GameAnswerResult, GameError> {
        let mut pending = session.begin_answer(option, self.clock.now())?;
        match self.persist_answer(session, &mut pending).await {
            Ok(result) => Ok(result),
            Err(err) => {
                tracing::warn!(
                    user_id = %session.user_id(),
                    character_id = %pending.outcome.character_id,
                    error = %err,
                    "answer not saved, kept for retry"
                );
                session.park_answer(pending);
                Err(err)
            }
        }
    }

    async fn persist_answer(
        &self,
        session: &mut GameSession,
        pending: &mut PendingAnswer,
    ) -> Result<GameAnswerResult, GameError> {
        let user_id = session.user_id().clone();
        let outcome = pending.outcome.clone();

        let progress = match &pending.progress {
            Some(progress) => progress.clone(),
            None => {
                let progress = self
                    .progress
                    .record_answer(&user_id, outcome.character_id, outcome.correct)
                    .await?;
                pending.progress = Some(progress.clone());
                progress
            }
        };

        let experience = match &pending.experience {
            Some(gain) => gain.clone(),
            None => {
                let gain = if outcome.points > 0 {
                    Some(self.users.add_experience(&user_id, outcome.points).await?)
                } else {
                    None
                };
                pending.experience = Some(gain.clone());
                gain
            }
        };

        session.commit_pending(pending);

        let learned = self.progress.mastered_count(&user_id).await?;
        let unlocked = self
            .achievements
            .evaluate(
                &user_id,
                &AchievementContext {
                    characters_learned: learned,
                    ..AchievementContext::default()
                },
            )
            .await?;
        pending.unlocked.extend(unlocked);

        if session.is_complete() {
            self.finalize_record(session).await?;
            let unlocked = self.evaluate_session(session, learned).await?;
            pending.unlocked.extend(unlocked);
        }

        Ok(GameAnswerResult {
            outcome,
            progress,
            experience,
            unlocked: std::mem::take(&mut pending.unlocked),
            is_complete: session.is_complete(),
            record_id: session.record_id(),
        })
    }

    /// Store the record of a completed game. Safe to call again after a
    /// failed append; an already stored game returns its id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InProgress` if the game is not finished yet.
    /// Returns `GameError::Storage` if persistence fails.
    pub async fn finalize_record(
        &self,
        session: &mut GameSession,
    ) -> Result<GameSessionId, GameError> {
        if let Some(id) = session.record_id() {
            return Ok(id);
        }
        if !session.is_complete() {
            return Err(SessionError::InProgress.into());
        }

        let record = session.record()?;
        let id = self.sessions.append_session(&record).await?;
        session.set_record_id(id);

        let results = session.results();
        tracing::info!(
            user_id = %record.user_id,
            session_id = %id,
            score = results.score,
            accuracy = results.accuracy,
            secs = record.time_spent_secs,
            "game completed"
        );
        Ok(id)
    }

    async fn evaluate_session(
        &self,
        session: &GameSession,
        characters_learned: u64,
    ) -> Result<Vec<Achievement>, GameError> {
        let user_id = session.user_id();
        let since = self.clock.now() - Duration::days(STREAK_WINDOW_DAYS);
        let recent = self.sessions.list_completed_since(user_id, since).await?;
        let streak = streak_days(
            recent
                .iter()
                .filter_map(|s| s.completed_at)
                .map(|t| t.date_naive()),
            self.clock.today(),
        );

        let ctx = AchievementContext {
            characters_learned,
            session_accuracy: Some(session.results().accuracy),
            streak_days: streak,
            session_secs: Some(session.time_spent_secs()),
        };
        Ok(self.achievements.evaluate(user_id, &ctx).await?)
    }
}
