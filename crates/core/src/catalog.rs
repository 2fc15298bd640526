//! Built-in vocabulary table and level-based lookups.
//!
//! Tiers follow character frequency:
//! - 1: most common characters (HSK 1-2)
//! - 2: common characters (HSK 3)
//! - 3: intermediate characters (HSK 4)
//! - 4: advanced characters (HSK 5-6)

use std::collections::BTreeSet;
use std::sync::LazyLock;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{Category, CharacterId, ChineseCharacter, Difficulty};

use Category::{
    Adjectives, Adverbs, MeasureWords, Nouns, Numbers, Particles, Prepositions, Pronouns,
    QuestionWords, Verbs,
};

type Row = (u32, &'static str, &'static str, &'static str, u8, Category);

#[rustfmt::skip]
const ROWS: [Row; 75] = [
    (1, "的", "de", "possessive particle", 1, Particles),
    (2, "一", "yī", "one", 1, Numbers),
    (3, "是", "shì", "to be", 1, Verbs),
    (4, "了", "le", "completed action particle", 1, Particles),
    (5, "人", "rén", "person", 1, Nouns),
    (6, "我", "wǒ", "I/me", 1, Pronouns),
    (7, "在", "zài", "at/in/on", 1, Prepositions),
    (8, "有", "yǒu", "to have", 1, Verbs),
    (9, "他", "tā", "he/him", 1, Pronouns),
    (10, "这", "zhè", "this", 1, Pronouns),
    (11, "个", "gè", "measure word", 1, MeasureWords),
    (12, "们", "men", "plural suffix", 1, Particles),
    (13, "好", "hǎo", "good", 1, Adjectives),
    (14, "来", "lái", "to come", 1, Verbs),
    (15, "就", "jiù", "then/at once", 1, Adverbs),
    (16, "你", "nǐ", "you", 1, Pronouns),
    (17, "什", "shén", "what", 1, QuestionWords),
    (18, "么", "me", "question particle", 1, Particles),
    (19, "时", "shí", "time", 1, Nouns),
    (20, "候", "hòu", "time (when)", 1, Nouns),
    (21, "会", "huì", "can/will", 1, Verbs),
    (22, "说", "shuō", "to say", 1, Verbs),
    (23, "去", "qù", "to go", 1, Verbs),
    (24, "看", "kàn", "to look/see", 1, Verbs),
    (25, "做", "zuò", "to do", 1, Verbs),
    (26, "很", "hěn", "very", 1, Adverbs),
    (27, "大", "dà", "big", 1, Adjectives),
    (28, "小", "xiǎo", "small", 1, Adjectives),
    (29, "多", "duō", "many/much", 1, Adjectives),
    (30, "少", "shǎo", "few/little", 1, Adjectives),
    (31, "想", "xiǎng", "to think/want", 2, Verbs),
    (32, "知", "zhī", "to know", 2, Verbs),
    (33, "道", "dào", "way/path", 2, Nouns),
    (34, "年", "nián", "year", 2, Nouns),
    (35, "月", "yuè", "month", 2, Nouns),
    (36, "日", "rì", "day/sun", 2, Nouns),
    (37, "国", "guó", "country", 2, Nouns),
    (38, "家", "jiā", "home/family", 2, Nouns),
    (39, "中", "zhōng", "middle/China", 2, Nouns),
    (40, "文", "wén", "language/culture", 2, Nouns),
    (41, "学", "xué", "to study", 2, Verbs),
    (42, "生", "shēng", "life/student", 2, Nouns),
    (43, "工", "gōng", "work", 2, Nouns),
    (44, "作", "zuò", "to work", 2, Verbs),
    (45, "朋", "péng", "friend", 2, Nouns),
    (46, "友", "yǒu", "friend", 2, Nouns),
    (47, "吃", "chī", "to eat", 2, Verbs),
    (48, "喝", "hē", "to drink", 2, Verbs),
    (49, "买", "mǎi", "to buy", 2, Verbs),
    (50, "卖", "mài", "to sell", 2, Verbs),
    (51, "希", "xī", "to hope", 3, Verbs),
    (52, "望", "wàng", "to hope/look", 3, Verbs),
    (53, "忘", "wàng", "to forget", 3, Verbs),
    (54, "记", "jì", "to remember", 3, Verbs),
    (55, "得", "děi", "must/get", 3, Verbs),
    (56, "应", "yīng", "should", 3, Verbs),
    (57, "该", "gāi", "should", 3, Verbs),
    (58, "须", "xū", "must", 3, Verbs),
    (59, "要", "yào", "to want", 3, Verbs),
    (60, "需", "xū", "to need", 3, Verbs),
    (61, "经", "jīng", "through/experience", 3, Nouns),
    (62, "历", "lì", "experience", 3, Nouns),
    (63, "史", "shǐ", "history", 3, Nouns),
    (64, "社", "shè", "society", 3, Nouns),
    (65, "会", "huì", "society/meeting", 3, Nouns),
    (66, "辉", "huī", "brilliance", 4, Adjectives),
    (67, "煌", "huáng", "brilliant", 4, Adjectives),
    (68, "璀", "cuī", "lustrous", 4, Adjectives),
    (69, "璨", "càn", "bright", 4, Adjectives),
    (70, "瑰", "guī", "precious", 4, Adjectives),
    (71, "奇", "qí", "strange/odd", 4, Adjectives),
    (72, "异", "yì", "different", 4, Adjectives),
    (73, "罕", "hǎn", "rare", 4, Adjectives),
    (74, "鲜", "xiān", "fresh/rare", 4, Adjectives),
    (75, "睿", "ruì", "wise", 4, Adjectives),
];

/// The full catalog, in id order.
pub static CHARACTERS: LazyLock<Vec<ChineseCharacter>> = LazyLock::new(|| {
    ROWS.iter()
        .map(|&(id, glyph, pinyin, meaning, tier, category)| {
            let difficulty = Difficulty::ALL[usize::from(tier.clamp(1, 4) - 1)];
            ChineseCharacter::new(
                CharacterId::new(id),
                glyph,
                pinyin,
                meaning,
                difficulty,
                category,
            )
        })
        .collect()
});

/// All characters, in id order.
#[must_use]
pub fn all() -> &'static [ChineseCharacter] {
    &CHARACTERS
}

#[must_use]
pub fn find(id: CharacterId) -> Option<&'static ChineseCharacter> {
    CHARACTERS.iter().find(|c| c.id == id)
}

/// First entry with the given glyph. Some glyphs appear under more than one
/// tier (会), so the lower id wins.
#[must_use]
pub fn find_by_glyph(glyph: &str) -> Option<&'static ChineseCharacter> {
    CHARACTERS.iter().find(|c| c.character == glyph)
}

/// Highest difficulty tier unlocked at a user level.
#[must_use]
pub fn max_difficulty_for_level(level: u32) -> Difficulty {
    match level {
        0..=5 => Difficulty::Beginner,
        6..=15 => Difficulty::Elementary,
        16..=30 => Difficulty::Intermediate,
        _ => Difficulty::Advanced,
    }
}

fn level_pool(level: u32) -> Vec<ChineseCharacter> {
    let max = max_difficulty_for_level(level);
    CHARACTERS
        .iter()
        .filter(|c| c.difficulty <= max)
        .cloned()
        .collect()
}

/// Up to `count` random characters unlocked at `level`.
pub fn characters_for_level<R: Rng + ?Sized>(
    level: u32,
    count: usize,
    rng: &mut R,
) -> Vec<ChineseCharacter> {
    let mut pool = level_pool(level);
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

/// Up to `count` random characters of `category` unlocked at `level`.
pub fn characters_for_category_and_level<R: Rng + ?Sized>(
    category: Category,
    level: u32,
    count: usize,
    rng: &mut R,
) -> Vec<ChineseCharacter> {
    characters_for_level(level, CHARACTERS.len(), rng)
        .into_iter()
        .filter(|c| c.category == category)
        .take(count)
        .collect()
}

/// Sorted, de-duplicated categories present at `level`.
#[must_use]
pub fn available_categories(level: u32) -> Vec<Category> {
    level_pool(level)
        .into_iter()
        .map(|c| c.category)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Catalog listing with optional difficulty ceiling and category, in id order.
#[must_use]
pub fn filter(
    max_difficulty: Option<Difficulty>,
    category: Option<Category>,
) -> Vec<ChineseCharacter> {
    CHARACTERS
        .iter()
        .filter(|c| max_difficulty.is_none_or(|max| c.difficulty <= max))
        .filter(|c| category.is_none_or(|cat| c.category == cat))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn count_tier(d: Difficulty) -> usize {
        CHARACTERS.iter().filter(|c| c.difficulty == d).count()
    }

    #[test]
    fn catalog_has_expected_tiers() {
        assert_eq!(CHARACTERS.len(), 75);
        assert_eq!(count_tier(Difficulty::Beginner), 30);
        assert_eq!(count_tier(Difficulty::Elementary), 20);
        assert_eq!(count_tier(Difficulty::Intermediate), 15);
        assert_eq!(count_tier(Difficulty::Advanced), 10);

        let ids: HashSet<_> = CHARACTERS.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 75);
    }

    #[test]
    fn lookups_work() {
        let wo = find(CharacterId::new(6)).unwrap();
        assert_eq!(wo.character, "我");
        assert_eq!(wo.pinyin, "wǒ");
        assert!(find(CharacterId::new(76)).is_none());

        assert_eq!(find_by_glyph("会").unwrap().id, CharacterId::new(21));
    }

    #[test]
    fn max_difficulty_bands() {
        assert_eq!(max_difficulty_for_level(1), Difficulty::Beginner);
        assert_eq!(max_difficulty_for_level(5), Difficulty::Beginner);
        assert_eq!(max_difficulty_for_level(6), Difficulty::Elementary);
        assert_eq!(max_difficulty_for_level(15), Difficulty::Elementary);
        assert_eq!(max_difficulty_for_level(30), Difficulty::Intermediate);
        assert_eq!(max_difficulty_for_level(31), Difficulty::Advanced);
    }

    #[test]
    fn level_pool_respects_ceiling_and_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked = characters_for_level(3, 20, &mut rng);
        assert_eq!(picked.len(), 20);
        assert!(picked.iter().all(|c| c.difficulty == Difficulty::Beginner));

        let everything = characters_for_level(3, 500, &mut rng);
        assert_eq!(everything.len(), 30);
    }

    #[test]
    fn category_pool_filters() {
        let mut rng = StdRng::seed_from_u64(1);
        let pronouns = characters_for_category_and_level(Category::Pronouns, 1, 10, &mut rng);
        assert_eq!(pronouns.len(), 4);
        assert!(pronouns.iter().all(|c| c.category == Category::Pronouns));

        let two = characters_for_category_and_level(Category::Pronouns, 1, 2, &mut rng);
        assert_eq!(two.len(), 2);
    }

    #[test]
    fn categories_grow_with_level() {
        let beginner = available_categories(1);
        assert!(beginner.contains(&Category::QuestionWords));
        assert!(beginner.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(available_categories(40).len(), beginner.len());
    }

    #[test]
    fn filter_combines_ceiling_and_category() {
        assert_eq!(filter(None, None).len(), 75);
        let nouns = filter(Some(Difficulty::Elementary), Some(Category::Nouns));
        assert!(nouns.iter().all(|c| c.category == Category::Nouns));
        assert!(nouns.iter().all(|c| c.difficulty <= Difficulty::Elementary));
        assert_eq!(nouns.len(), 15);
        assert!(nouns.windows(2).all(|w| w[0].id < w[1].id));
    }
}
