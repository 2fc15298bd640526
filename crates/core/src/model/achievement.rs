use serde::{Deserialize, Serialize};

use crate::model::ids::AchievementId;

/// What an achievement's requirement is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    /// Accuracy of a single completed session, in percent.
    Score,
    /// Consecutive days with at least one completed session.
    Streak,
    /// Number of mastered characters.
    CharactersLearned,
    /// A completed session lasting at most `requirement` seconds.
    TimePlayed,
}

/// Static achievement definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub requirement: u64,
    pub kind: AchievementKind,
}

/// An achievement definition paired with whether the user has it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub unlocked: bool,
}
