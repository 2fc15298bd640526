use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{CharacterId, UserId};

/// Per-user answer history for one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: UserId,
    pub character_id: CharacterId,
    pub attempts: u32,
    pub correct_attempts: u32,
    pub last_attempt_at: DateTime<Utc>,
    pub mastered: bool,
}

impl UserProgress {
    /// Progress entry for the very first answer. A first answer never masters
    /// a character, even with a threshold of one.
    #[must_use]
    pub fn first_attempt(
        user_id: UserId,
        character_id: CharacterId,
        correct: bool,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            character_id,
            attempts: 1,
            correct_attempts: u32::from(correct),
            last_attempt_at: at,
            mastered: false,
        }
    }

    /// Records another answer. Mastery is sticky since the correct count
    /// never decreases.
    pub fn record_attempt(&mut self, correct: bool, at: DateTime<Utc>, mastery_threshold: u32) {
        self.attempts = self.attempts.saturating_add(1);
        if correct {
            self.correct_attempts = self.correct_attempts.saturating_add(1);
        }
        self.last_attempt_at = at;
        self.mastered = self.correct_attempts >= mastery_threshold;
    }

    /// Share of correct answers, rounded to a whole percent.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        crate::scoring::accuracy_percent(self.correct_attempts, self.attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::MASTERY_THRESHOLD;
    use crate::time::fixed_now;

    fn entry(correct: bool) -> UserProgress {
        UserProgress::first_attempt(
            UserId::new("u1").unwrap(),
            CharacterId::new(6),
            correct,
            fixed_now(),
        )
    }

    #[test]
    fn first_attempt_is_never_mastered() {
        let p = entry(true);
        assert_eq!(p.attempts, 1);
        assert_eq!(p.correct_attempts, 1);
        assert!(!p.mastered);
    }

    #[test]
    fn third_correct_answer_masters() {
        let mut p = entry(true);
        p.record_attempt(false, fixed_now(), MASTERY_THRESHOLD);
        p.record_attempt(true, fixed_now(), MASTERY_THRESHOLD);
        assert!(!p.mastered);
        p.record_attempt(true, fixed_now(), MASTERY_THRESHOLD);
        assert!(p.mastered);
        assert_eq!(p.attempts, 4);
        assert_eq!(p.correct_attempts, 3);
    }

    #[test]
    fn mastery_survives_wrong_answers() {
        let mut p = entry(true);
        p.record_attempt(true, fixed_now(), MASTERY_THRESHOLD);
        p.record_attempt(true, fixed_now(), MASTERY_THRESHOLD);
        p.record_attempt(false, fixed_now(), MASTERY_THRESHOLD);
        assert!(p.mastered);
        assert_eq!(p.accuracy_percent(), 75);
    }
}
