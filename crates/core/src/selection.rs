//! Adaptive character selection.
//!
//! A session draws a difficulty-weighted sample without replacement from the
//! characters unlocked at the user's level. Tiers are mixed by fixed
//! percentages per level band, and any slots the mix leaves open are filled
//! from the rest of the pool.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::catalog;
use crate::model::{Category, CharacterId, ChineseCharacter, Difficulty};

/// Inputs for one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOptions {
    pub user_level: u32,
    pub count: usize,
    pub category: Option<Category>,
    pub exclude_ids: Vec<CharacterId>,
}

impl SelectionOptions {
    /// Ten characters, any category, nothing excluded.
    #[must_use]
    pub fn for_level(user_level: u32) -> Self {
        Self {
            user_level,
            count: 10,
            category: None,
            exclude_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn excluding(mut self, ids: impl IntoIterator<Item = CharacterId>) -> Self {
        self.exclude_ids.extend(ids);
        self
    }
}

/// Share of a session, in percent, given to each tier. Ascending by tier.
#[must_use]
pub fn difficulty_mix(user_level: u32) -> &'static [(Difficulty, u32)] {
    use Difficulty::{Advanced, Beginner, Elementary, Intermediate};

    match user_level {
        0..=3 => &[(Beginner, 100)],
        4..=8 => &[(Beginner, 80), (Elementary, 20)],
        9..=15 => &[(Beginner, 60), (Elementary, 40)],
        16..=25 => &[(Beginner, 30), (Elementary, 50), (Intermediate, 20)],
        26..=35 => &[(Elementary, 40), (Intermediate, 50), (Advanced, 10)],
        _ => &[(Elementary, 20), (Intermediate, 50), (Advanced, 30)],
    }
}

/// `ceil(count * percent / 100)` without going through floats.
fn tier_target(count: usize, percent: u32) -> usize {
    let percent = usize::try_from(percent).unwrap_or(100);
    count.saturating_mul(percent).div_ceil(100)
}

/// Picks up to `options.count` distinct characters for a session.
///
/// Every result is unlocked at the user's level and none is in
/// `options.exclude_ids`.
pub fn select_characters_for_user<R: Rng + ?Sized>(
    options: &SelectionOptions,
    rng: &mut R,
) -> Vec<ChineseCharacter> {
    let count = options.count;
    let pool_size = count.saturating_mul(2);

    let mut available = match options.category {
        Some(category) => catalog::characters_for_category_and_level(
            category,
            options.user_level,
            pool_size,
            rng,
        ),
        None => catalog::characters_for_level(options.user_level, pool_size, rng),
    };
    available.retain(|c| !options.exclude_ids.contains(&c.id));

    let mut selected: Vec<ChineseCharacter> = Vec::with_capacity(count);

    for &(difficulty, percent) in difficulty_mix(options.user_level) {
        let target = tier_target(count, percent);
        let mut tier: Vec<&ChineseCharacter> = available
            .iter()
            .filter(|c| c.difficulty == difficulty && !contains(&selected, c.id))
            .collect();
        tier.shuffle(rng);
        selected.extend(tier.into_iter().take(target).cloned());
    }

    let remaining = count.saturating_sub(selected.len());
    if remaining > 0 {
        let mut rest: Vec<&ChineseCharacter> = available
            .iter()
            .filter(|c| !contains(&selected, c.id))
            .collect();
        rest.shuffle(rng);
        let fill: Vec<ChineseCharacter> = rest.into_iter().take(remaining).cloned().collect();
        selected.extend(fill);
    }

    selected.truncate(count);
    selected.shuffle(rng);
    selected
}

fn contains(selected: &[ChineseCharacter], id: CharacterId) -> bool {
    selected.iter().any(|c| c.id == id)
}

//
// ─── RECOMMENDATIONS ───────────────────────────────────────────────────────────
//

/// Study guidance shown next to a user's level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearningRecommendation {
    pub description: &'static str,
    pub focus: Vec<&'static str>,
    pub next_milestone: &'static str,
}

#[must_use]
pub fn learning_recommendations(user_level: u32) -> LearningRecommendation {
    match user_level {
        0..=5 => LearningRecommendation {
            description: "Building your foundation with the most essential Chinese characters",
            focus: vec![
                "Basic pronouns (我, 你, 他)",
                "Simple verbs (是, 有, 去)",
                "Common particles (的, 了)",
            ],
            next_milestone: "Master 50 basic characters to advance to everyday vocabulary",
        },
        6..=15 => LearningRecommendation {
            description: "Learning everyday characters for practical communication",
            focus: vec![
                "Family and relationships",
                "Daily activities",
                "Time expressions",
            ],
            next_milestone: "Complete 150 characters to reach intermediate level",
        },
        16..=30 => LearningRecommendation {
            description: "Expanding to intermediate vocabulary for deeper conversations",
            focus: vec![
                "Abstract concepts",
                "Workplace vocabulary",
                "Cultural expressions",
            ],
            next_milestone: "Master 300 characters to unlock advanced content",
        },
        _ => LearningRecommendation {
            description: "Mastering advanced characters for fluent expression",
            focus: vec![
                "Literary expressions",
                "Specialized vocabulary",
                "Nuanced meanings",
            ],
            next_milestone: "Continue practicing to maintain and expand your expertise",
        },
    }
}
