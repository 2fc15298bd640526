use serde::Serialize;

use crate::model::Difficulty;
use crate::rules::GameRules;

/// Level reached with the given experience, using the default rules.
#[must_use]
pub fn level_for_experience(experience: u64) -> u32 {
    GameRules::default().level_for(experience)
}

/// Experience still missing before the next level.
#[must_use]
pub fn experience_to_next_level(experience: u64, rules: &GameRules) -> u64 {
    let per_level = rules.xp_per_level.max(1);
    per_level - experience % per_level
}

/// Progress through the current level, in whole percent.
#[must_use]
pub fn level_progress_percent(experience: u64, rules: &GameRules) -> u32 {
    let per_level = rules.xp_per_level.max(1);
    u32::try_from((experience % per_level) * 100 / per_level).unwrap_or(100)
}

/// Points awarded for one answer.
///
/// Base points are `difficulty * 100`. Revealing the pinyin hint keeps only
/// `hint_points_percent` of them, rounded half up. Wrong answers score zero.
#[must_use]
pub fn points_for_answer(
    difficulty: Difficulty,
    hint_used: bool,
    correct: bool,
    rules: &GameRules,
) -> u64 {
    if !correct {
        return 0;
    }
    let base = u64::from(difficulty.as_u8()) * 100;
    if hint_used {
        let keep = u64::from(rules.hint_points_percent);
        (base * keep + 50) / 100
    } else {
        base
    }
}

/// `round(correct / total * 100)`; zero when nothing was answered.
#[must_use]
pub fn accuracy_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    u32::try_from((correct * 200 + total) / (total * 2)).unwrap_or(100)
}

/// Feedback tier for a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    Excellent,
    Great,
    Good,
    KeepPracticing,
}

impl Performance {
    #[must_use]
    pub fn from_accuracy(accuracy: u32) -> Self {
        match accuracy {
            90.. => Performance::Excellent,
            70..=89 => Performance::Great,
            50..=69 => Performance::Good,
            _ => Performance::KeepPracticing,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Performance::Excellent => "出色! Excellent!",
            Performance::Great => "很好! Great job!",
            Performance::Good => "不错! Good work!",
            Performance::KeepPracticing => "继续努力! Keep practicing!",
        }
    }

    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            Performance::Excellent => "🎉",
            Performance::Great => "👍",
            Performance::Good => "👌",
            Performance::KeepPracticing => "💪",
        }
    }
}
