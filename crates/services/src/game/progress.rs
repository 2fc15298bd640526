use chrono::{DateTime, Utc};
use serde::Serialize;

use hanzi_core::model::{Achievement, CharacterId, UserProgress};
use hanzi_core::scoring::Performance;

use crate::user_service::ExperienceGain;

/// Outcome of a single answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub character_id: CharacterId,
    pub correct: bool,
    pub points: u64,
    pub correct_meaning: String,
}

/// Position within a game, 1-based like the progress bar it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameProgress {
    pub current: usize,
    pub total: usize,
    pub answered: usize,
}

impl GameProgress {
    /// Share of questions answered, in whole percent.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        u32::try_from(self.answered * 100 / self.total).unwrap_or(100)
    }
}

/// Final tally shown when a game ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameResults {
    pub score: u64,
    pub correct: u32,
    pub incorrect: u32,
    pub total: u32,
    pub accuracy: u32,
    pub performance: Performance,
}

/// A graded answer whose writes have not all succeeded yet.
///
/// Each step is stored once it is persisted so a retry resumes where the
/// failed attempt stopped.
#[derive(Debug, Clone)]
pub(crate) struct PendingAnswer {
    pub(crate) option: String,
    pub(crate) outcome: AnswerOutcome,
    pub(crate) answered_at: DateTime<Utc>,
    pub(crate) progress: Option<UserProgress>,
    pub(crate) experience: Option<Option<ExperienceGain>>,
    pub(crate) committed: bool,
    pub(crate) unlocked: Vec<Achievement>,
}

impl PendingAnswer {
    pub(crate) fn new(option: &str, outcome: AnswerOutcome, answered_at: DateTime<Utc>) -> Self {
        Self {
            option: option.to_string(),
            outcome,
            answered_at,
            progress: None,
            experience: None,
            committed: false,
            unlocked: Vec::new(),
        }
    }
}
