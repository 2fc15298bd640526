use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;

use hanzi_core::catalog;
use hanzi_core::model::{Category, CharacterId, ChineseCharacter};
use hanzi_core::quiz::Question;
use hanzi_core::selection::{
    self, LearningRecommendation, SelectionOptions, learning_recommendations,
};

/// Catalog queries and randomized selection.
///
/// Owns the random source so a seeded service replays the same games.
pub struct CharacterService {
    rng: Mutex<StdRng>,
}

impl Default for CharacterService {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterService {
    /// Service seeded from the thread-local generator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_rng(&mut rand::rng())),
        }
    }

    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Characters for one game, picked by the adaptive selection policy.
    #[must_use]
    pub fn select_for_user(&self, options: &SelectionOptions) -> Vec<ChineseCharacter> {
        let picked = selection::select_characters_for_user(options, &mut *self.rng());
        tracing::debug!(
            level = options.user_level,
            requested = options.count,
            excluded = options.exclude_ids.len(),
            picked = picked.len(),
            "selected characters"
        );
        picked
    }

    /// One multiple-choice question per character, in the given order.
    #[must_use]
    pub fn questions_for(
        &self,
        characters: Vec<ChineseCharacter>,
        option_count: usize,
    ) -> Vec<Question> {
        let mut rng = self.rng();
        characters
            .into_iter()
            .map(|c| Question::generate(c, option_count, &mut *rng))
            .collect()
    }

    /// Catalog listing, optionally limited to what a user `level` has
    /// unlocked and to one category.
    #[must_use]
    pub fn list_characters(
        &self,
        level: Option<u32>,
        category: Option<Category>,
    ) -> Vec<ChineseCharacter> {
        catalog::filter(level.map(catalog::max_difficulty_for_level), category)
    }

    #[must_use]
    pub fn get_character(&self, id: CharacterId) -> Option<ChineseCharacter> {
        catalog::find(id).cloned()
    }

    #[must_use]
    pub fn categories(&self, level: u32) -> Vec<Category> {
        catalog::available_categories(level)
    }

    #[must_use]
    pub fn recommendations(&self, level: u32) -> LearningRecommendation {
        learning_recommendations(level)
    }
}
