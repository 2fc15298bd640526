use std::sync::Arc;

use serde::Serialize;

use hanzi_core::model::UserId;
use storage::repository::{GameSessionRepository, ProgressRepository, StorageError};

/// Lifetime totals over a user's completed games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_sessions: u64,
    pub total_characters_learned: u64,
    pub average_score: u64,
    pub total_time_spent_secs: u64,
}

#[derive(Clone)]
pub struct StatsService {
    progress: Arc<dyn ProgressRepository>,
    sessions: Arc<dyn GameSessionRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(
        progress: Arc<dyn ProgressRepository>,
        sessions: Arc<dyn GameSessionRepository>,
    ) -> Self {
        Self { progress, sessions }
    }

    /// Totals over completed games only. `average_score` is the rounded mean
    /// score, zero without any completed game.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    pub async fn user_stats(&self, user_id: &UserId) -> Result<UserStats, StorageError> {
        let sessions = self.sessions.list_sessions(user_id, u32::MAX).await?;

        let mut total_sessions: u64 = 0;
        let mut total_score: u64 = 0;
        let mut total_time: u64 = 0;
        for session in sessions.iter().filter(|s| s.is_completed()) {
            total_sessions += 1;
            total_score = total_score.saturating_add(session.score);
            total_time = total_time.saturating_add(session.time_spent_secs);
        }

        let learned = self
            .progress
            .list_progress(user_id)
            .await?
            .iter()
            .filter(|p| p.mastered)
            .count();

        let average_score = if total_sessions == 0 {
            0
        } else {
            (total_score + total_sessions / 2) / total_sessions
        };

        Ok(UserStats {
            total_sessions,
            total_characters_learned: u64::try_from(learned).unwrap_or(u64::MAX),
            average_score,
            total_time_spent_secs: total_time,
        })
    }
}
