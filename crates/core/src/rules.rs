//! Tunable game constants.

use serde::{Deserialize, Serialize};

/// Experience needed per level.
pub const XP_PER_LEVEL: u64 = 1000;

/// Correct answers needed before a character counts as learned.
pub const MASTERY_THRESHOLD: u32 = 3;

/// Rules shared by the scoring, progress and session code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRules {
    pub questions_per_session: usize,
    pub mastery_threshold: u32,
    pub xp_per_level: u64,
    /// Percent of the base points kept when the pinyin hint was shown.
    pub hint_points_percent: u32,
    pub options_per_question: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            questions_per_session: 10,
            mastery_threshold: MASTERY_THRESHOLD,
            xp_per_level: XP_PER_LEVEL,
            hint_points_percent: 50,
            options_per_question: 4,
        }
    }
}

impl GameRules {
    /// Overrides the number of questions per session.
    #[must_use]
    pub fn with_questions_per_session(mut self, count: usize) -> Self {
        self.questions_per_session = count;
        self
    }

    /// Level reached with the given experience (`xp / xp_per_level + 1`).
    #[must_use]
    pub fn level_for(&self, experience: u64) -> u32 {
        let per_level = self.xp_per_level.max(1);
        u32::try_from(experience / per_level)
            .unwrap_or(u32::MAX - 1)
            .saturating_add(1)
    }
}
