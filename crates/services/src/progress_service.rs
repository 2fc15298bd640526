use std::sync::Arc;

use hanzi_core::GameRules;
use hanzi_core::model::{CharacterId, UserId, UserProgress};
use storage::repository::{ProgressRepository, StorageError};

use crate::Clock;

/// Per-character answer history and mastery.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    rules: GameRules,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, rules: GameRules, progress: Arc<dyn ProgressRepository>) -> Self {
        Self {
            clock,
            rules,
            progress,
        }
    }

    /// Record one answer and persist the updated entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be loaded or stored.
    pub async fn record_answer(
        &self,
        user_id: &UserId,
        character_id: CharacterId,
        correct: bool,
    ) -> Result<UserProgress, StorageError> {
        let now = self.clock.now();
        let entry = match self.progress.get_progress(user_id, character_id).await? {
            Some(mut existing) => {
                let was_mastered = existing.mastered;
                existing.record_attempt(correct, now, self.rules.mastery_threshold);
                if existing.mastered && !was_mastered {
                    tracing::info!(user_id = %user_id, character_id = %character_id, "character mastered");
                }
                existing
            }
            None => UserProgress::first_attempt(user_id.clone(), character_id, correct, now),
        };
        self.progress
            .upsert_progress(std::slice::from_ref(&entry))
            .await?;
        Ok(entry)
    }

    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    pub async fn list_progress(&self, user_id: &UserId) -> Result<Vec<UserProgress>, StorageError> {
        self.progress.list_progress(user_id).await
    }

    /// Number of mastered characters.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    pub async fn mastered_count(&self, user_id: &UserId) -> Result<u64, StorageError> {
        let mastered = self.mastered_ids(user_id).await?;
        Ok(u64::try_from(mastered.len()).unwrap_or(u64::MAX))
    }

    /// Ids of mastered characters, ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    pub async fn mastered_ids(&self, user_id: &UserId) -> Result<Vec<CharacterId>, StorageError> {
        let entries = self.progress.list_progress(user_id).await?;
        Ok(entries
            .into_iter()
            .filter(|p| p.mastered)
            .map(|p| p.character_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanzi_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn third_correct_answer_masters_character() {
        let svc = ProgressService::new(
            fixed_clock(),
            GameRules::default(),
            Arc::new(InMemoryRepository::new()),
        );
        let uid = UserId::new("u1").unwrap();
        let cid = CharacterId::new(4);

        let first = svc.record_answer(&uid, cid, true).await.unwrap();
        assert_eq!(first.attempts, 1);
        assert!(!first.mastered);

        svc.record_answer(&uid, cid, false).await.unwrap();
        svc.record_answer(&uid, cid, true).await.unwrap();
        assert_eq!(svc.mastered_count(&uid).await.unwrap(), 0);

        let last = svc.record_answer(&uid, cid, true).await.unwrap();
        assert_eq!(last.attempts, 4);
        assert_eq!(last.correct_attempts, 3);
        assert!(last.mastered);
        assert_eq!(svc.mastered_ids(&uid).await.unwrap(), vec![cid]);

        let after_miss = svc.record_answer(&uid, cid, false).await.unwrap();
        assert!(after_miss.mastered);
    }

    #[tokio::test]
    async fn progress_is_scoped_per_user() {
        let svc = ProgressService::new(
            fixed_clock(),
            GameRules::default(),
            Arc::new(InMemoryRepository::new()),
        );
        let a = UserId::new("a").unwrap();
        let b = UserId::new("b").unwrap();
        svc.record_answer(&a, CharacterId::new(1), true).await.unwrap();
        svc.record_answer(&a, CharacterId::new(2), true).await.unwrap();
        svc.record_answer(&b, CharacterId::new(1), false).await.unwrap();

        assert_eq!(svc.list_progress(&a).await.unwrap().len(), 2);
        let only_b = svc.list_progress(&b).await.unwrap();
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].correct_attempts, 0);
    }
}
