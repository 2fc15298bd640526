//! Multiple-choice question built around one character.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::Serialize;

use crate::model::ChineseCharacter;

/// Wrong-answer meanings mixed into the options.
pub const DISTRACTORS: [&str; 16] = [
    "hello",
    "goodbye",
    "thank you",
    "water",
    "fire",
    "earth",
    "big",
    "small",
    "beautiful",
    "ugly",
    "fast",
    "slow",
    "happy",
    "sad",
    "love",
    "hate",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    character: ChineseCharacter,
    options: Vec<String>,
    hint_used: bool,
}

impl Question {
    /// Builds a question with `option_count` shuffled options: the correct
    /// meaning plus distinct distractors that differ from it.
    pub fn generate<R: Rng + ?Sized>(
        character: ChineseCharacter,
        option_count: usize,
        rng: &mut R,
    ) -> Self {
        let wrong: Vec<&str> = DISTRACTORS
            .iter()
            .copied()
            .filter(|d| *d != character.meaning)
            .collect();
        let wanted = option_count.saturating_sub(1);

        let mut options: Vec<String> = Vec::with_capacity(wanted + 1);
        options.push(character.meaning.clone());
        options.extend(
            wrong
                .choose_multiple(rng, wanted)
                .map(|d| (*d).to_string()),
        );
        options.shuffle(rng);

        Self {
            character,
            options,
            hint_used: false,
        }
    }

    #[must_use]
    pub fn character(&self) -> &ChineseCharacter {
        &self.character
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Reveals the pinyin. Reduces the points for this question.
    pub fn reveal_hint(&mut self) -> &str {
        self.hint_used = true;
        &self.character.pinyin
    }

    #[must_use]
    pub fn hint_used(&self) -> bool {
        self.hint_used
    }

    #[must_use]
    pub fn check(&self, option: &str) -> bool {
        option == self.character.meaning
    }

    /// Index of the correct option.
    #[must_use]
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| self.check(o))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::model::CharacterId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn options_hold_answer_once_plus_distinct_distractors() {
        let mut rng = StdRng::seed_from_u64(11);
        for character in catalog::all() {
            let q = Question::generate(character.clone(), 4, &mut rng);
            assert_eq!(q.options().len(), 4);
            let unique: HashSet<_> = q.options().iter().collect();
            assert_eq!(unique.len(), 4);
            assert_eq!(
                q.options()
                    .iter()
                    .filter(|o| **o == character.meaning)
                    .count(),
                1
            );
        }
    }

    #[test]
    fn meaning_that_is_also_a_distractor_is_not_duplicated() {
        // 大 means "big", which is in the distractor list.
        let big = catalog::find(CharacterId::new(27)).unwrap().clone();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let q = Question::generate(big.clone(), 4, &mut rng);
            assert_eq!(q.options().iter().filter(|o| *o == "big").count(), 1);
        }
    }

    #[test]
    fn check_and_hint() {
        let wo = catalog::find(CharacterId::new(6)).unwrap().clone();
        let mut q = Question::generate(wo, 4, &mut StdRng::seed_from_u64(0));
        assert!(q.check("I/me"));
        assert!(!q.check("you"));
        let idx = q.correct_index().unwrap();
        assert_eq!(q.options()[idx], "I/me");

        assert!(!q.hint_used());
        assert_eq!(q.reveal_hint(), "wǒ");
        assert!(q.hint_used());
    }
}
