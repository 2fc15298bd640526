use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::CharacterId;

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DifficultyError {
    #[error("invalid difficulty value: {0} (expected 1-4)")]
    OutOfRange(u8),
}

/// Four-tier simplification of the HSK proficiency levels.
///
/// - `Beginner`: HSK 1-2, the most common characters
/// - `Elementary`: HSK 3
/// - `Intermediate`: HSK 4
/// - `Advanced`: HSK 5-6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Difficulty {
    Beginner,
    Elementary,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Beginner,
        Difficulty::Elementary,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    /// Converts a numeric tier (1-4) to a `Difficulty`.
    ///
    /// # Errors
    ///
    /// Returns `DifficultyError::OutOfRange` for anything outside 1-4.
    pub fn from_u8(value: u8) -> Result<Self, DifficultyError> {
        match value {
            1 => Ok(Self::Beginner),
            2 => Ok(Self::Elementary),
            3 => Ok(Self::Intermediate),
            4 => Ok(Self::Advanced),
            _ => Err(DifficultyError::OutOfRange(value)),
        }
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Difficulty::Beginner => 1,
            Difficulty::Elementary => 2,
            Difficulty::Intermediate => 3,
            Difficulty::Advanced => 4,
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.as_u8()
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = DifficultyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value)
    }
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown character category: {0}")]
pub struct ParseCategoryError(pub String);

/// Part-of-speech bucket used to filter the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Adjectives,
    Adverbs,
    MeasureWords,
    Nouns,
    Numbers,
    Particles,
    Prepositions,
    Pronouns,
    QuestionWords,
    Verbs,
}

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Adjectives => "adjectives",
            Category::Adverbs => "adverbs",
            Category::MeasureWords => "measure_words",
            Category::Nouns => "nouns",
            Category::Numbers => "numbers",
            Category::Particles => "particles",
            Category::Prepositions => "prepositions",
            Category::Pronouns => "pronouns",
            Category::QuestionWords => "question_words",
            Category::Verbs => "verbs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "adjectives" => Ok(Category::Adjectives),
            "adverbs" => Ok(Category::Adverbs),
            "measure_words" => Ok(Category::MeasureWords),
            "nouns" => Ok(Category::Nouns),
            "numbers" => Ok(Category::Numbers),
            "particles" => Ok(Category::Particles),
            "prepositions" => Ok(Category::Prepositions),
            "pronouns" => Ok(Category::Pronouns),
            "question_words" => Ok(Category::QuestionWords),
            "verbs" => Ok(Category::Verbs),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

//
// ─── CHARACTER ─────────────────────────────────────────────────────────────────
//

/// A single vocabulary entry shown on a flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChineseCharacter {
    pub id: CharacterId,
    pub character: String,
    pub pinyin: String,
    pub meaning: String,
    pub difficulty: Difficulty,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stroke_order: Vec<String>,
}

impl ChineseCharacter {
    #[must_use]
    pub fn new(
        id: CharacterId,
        character: impl Into<String>,
        pinyin: impl Into<String>,
        meaning: impl Into<String>,
        difficulty: Difficulty,
        category: Category,
    ) -> Self {
        Self {
            id,
            character: character.into(),
            pinyin: pinyin.into(),
            meaning: meaning.into(),
            difficulty,
            category,
            audio_url: None,
            stroke_order: Vec::new(),
        }
    }
}
