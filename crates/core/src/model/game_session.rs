use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{CharacterId, GameSessionId, UserId};

/// Persisted shape of a played game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionRecord {
    pub id: Option<GameSessionId>,
    pub user_id: UserId,
    pub characters_studied: Vec<CharacterId>,
    pub score: u64,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub time_spent_secs: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl GameSessionRecord {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Accuracy over the questions of this session.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        crate::scoring::accuracy_percent(self.correct_answers, self.total_questions)
    }
}
