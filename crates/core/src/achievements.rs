//! Built-in achievements and the rules that unlock them.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};

use crate::model::{Achievement, AchievementId, AchievementKind};

/// All achievements, in display order.
pub static ACHIEVEMENTS: LazyLock<Vec<Achievement>> = LazyLock::new(|| {
    vec![
        Achievement {
            id: AchievementId::new("1"),
            title: "First Steps",
            description: "Learn your first 10 characters",
            icon: "👶",
            requirement: 10,
            kind: AchievementKind::CharactersLearned,
        },
        Achievement {
            id: AchievementId::new("2"),
            title: "Perfect Score",
            description: "Get 100% accuracy in a game session",
            icon: "🎯",
            requirement: 100,
            kind: AchievementKind::Score,
        },
        Achievement {
            id: AchievementId::new("3"),
            title: "Hot Streak",
            description: "Maintain a 7-day learning streak",
            icon: "🔥",
            requirement: 7,
            kind: AchievementKind::Streak,
        },
        Achievement {
            id: AchievementId::new("4"),
            title: "Scholar",
            description: "Learn 50 characters",
            icon: "🎓",
            requirement: 50,
            kind: AchievementKind::CharactersLearned,
        },
        Achievement {
            id: AchievementId::new("5"),
            title: "Master",
            description: "Learn 100 characters",
            icon: "🏆",
            requirement: 100,
            kind: AchievementKind::CharactersLearned,
        },
        Achievement {
            id: AchievementId::new("6"),
            title: "Speed Learner",
            description: "Complete a session in under 2 minutes",
            icon: "⚡",
            requirement: 120,
            kind: AchievementKind::TimePlayed,
        },
    ]
});

#[must_use]
pub fn find(id: &AchievementId) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| &a.id == id)
}

/// Facts an unlock check is evaluated against.
///
/// Session fields are `None` outside of a just-completed session, so
/// per-answer checks only consider learned characters and streaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AchievementContext {
    pub characters_learned: u64,
    pub session_accuracy: Option<u32>,
    pub streak_days: u64,
    pub session_secs: Option<u64>,
}

impl Achievement {
    #[must_use]
    pub fn is_satisfied(&self, ctx: &AchievementContext) -> bool {
        match self.kind {
            AchievementKind::CharactersLearned => ctx.characters_learned >= self.requirement,
            AchievementKind::Score => ctx
                .session_accuracy
                .is_some_and(|acc| u64::from(acc) >= self.requirement),
            AchievementKind::Streak => ctx.streak_days >= self.requirement,
            AchievementKind::TimePlayed => {
                ctx.session_secs.is_some_and(|secs| secs <= self.requirement)
            }
        }
    }
}

/// Definitions satisfied by `ctx` that are not in `unlocked` yet.
#[must_use]
pub fn newly_unlocked<'a>(
    definitions: &'a [Achievement],
    unlocked: &[AchievementId],
    ctx: &AchievementContext,
) -> Vec<&'a Achievement> {
    definitions
        .iter()
        .filter(|a| !unlocked.contains(&a.id))
        .filter(|a| a.is_satisfied(ctx))
        .collect()
}

/// Length of the run of consecutive days with activity that ends today, or
/// yesterday when nothing has been played yet today.
#[must_use]
pub fn streak_days(activity: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u64 {
    let days: BTreeSet<NaiveDate> = activity.into_iter().filter(|d| *d <= today).collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}
