use std::sync::Arc;

use hanzi_core::achievements::{self, ACHIEVEMENTS, AchievementContext};
use hanzi_core::model::{Achievement, AchievementId, AchievementStatus, UserId};
use storage::repository::AchievementRepository;

use crate::error::AchievementServiceError;

/// Unlock bookkeeping over the built-in achievement table.
#[derive(Clone)]
pub struct AchievementService {
    unlocked: Arc<dyn AchievementRepository>,
}

impl AchievementService {
    #[must_use]
    pub fn new(unlocked: Arc<dyn AchievementRepository>) -> Self {
        Self { unlocked }
    }

    #[must_use]
    pub fn definitions(&self) -> &'static [Achievement] {
        &ACHIEVEMENTS
    }

    /// Every definition paired with the user's unlock state, in table order.
    ///
    /// # Errors
    ///
    /// Returns `AchievementServiceError::Storage` for backend failures.
    pub async fn catalog_with_status(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AchievementStatus>, AchievementServiceError> {
        let unlocked = self.unlocked.list_unlocked(user_id).await?;
        Ok(ACHIEVEMENTS
            .iter()
            .map(|a| AchievementStatus {
                achievement: a.clone(),
                unlocked: unlocked.contains(&a.id),
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `AchievementServiceError::Storage` for backend failures.
    pub async fn unlocked(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AchievementId>, AchievementServiceError> {
        Ok(self.unlocked.list_unlocked(user_id).await?)
    }

    /// Unlock one achievement. Returns `false` when it was already unlocked.
    ///
    /// # Errors
    ///
    /// Returns `AchievementServiceError::Unknown` for ids outside the table.
    /// Returns `AchievementServiceError::Storage` if persistence fails.
    pub async fn unlock(
        &self,
        user_id: &UserId,
        id: &AchievementId,
    ) -> Result<bool, AchievementServiceError> {
        let definition =
            achievements::find(id).ok_or_else(|| AchievementServiceError::Unknown(id.clone()))?;
        let mut unlocked = self.unlocked.list_unlocked(user_id).await?;
        if unlocked.contains(id) {
            return Ok(false);
        }
        unlocked.push(id.clone());
        self.unlocked.save_unlocked(user_id, &unlocked).await?;
        tracing::info!(user_id = %user_id, achievement = definition.title, "achievement unlocked");
        Ok(true)
    }

    /// Unlock and persist everything `ctx` satisfies that the user does not
    /// have yet. Returns the newly unlocked definitions.
    ///
    /// # Errors
    ///
    /// Returns `AchievementServiceError::Storage` if persistence fails.
    pub async fn evaluate(
        &self,
        user_id: &UserId,
        ctx: &AchievementContext,
    ) -> Result<Vec<Achievement>, AchievementServiceError> {
        let mut unlocked = self.unlocked.list_unlocked(user_id).await?;
        let fresh: Vec<Achievement> = achievements::newly_unlocked(&ACHIEVEMENTS, &unlocked, ctx)
            .into_iter()
            .cloned()
            .collect();
        if fresh.is_empty() {
            return Ok(fresh);
        }

        unlocked.extend(fresh.iter().map(|a| a.id.clone()));
        self.unlocked.save_unlocked(user_id, &unlocked).await?;
        for achievement in &fresh {
            tracing::info!(user_id = %user_id, achievement = achievement.title, "achievement unlocked");
        }
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    fn service() -> AchievementService {
        AchievementService::new(Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn unlock_is_idempotent() {
        let svc = service();
        let uid = UserId::new("u1").unwrap();
        let first_steps = AchievementId::new("1");

        assert!(svc.unlock(&uid, &first_steps).await.unwrap());
        assert!(!svc.unlock(&uid, &first_steps).await.unwrap());
        assert_eq!(svc.unlocked(&uid).await.unwrap(), vec![first_steps]);

        let err = svc.unlock(&uid, &AchievementId::new("99")).await.unwrap_err();
        assert!(matches!(err, AchievementServiceError::Unknown(_)));
    }

    #[tokio::test]
    async fn evaluate_unlocks_once_and_keeps_order() {
        let svc = service();
        let uid = UserId::new("u1").unwrap();
        let ctx = AchievementContext {
            characters_learned: 12,
            session_accuracy: Some(100),
            ..AchievementContext::default()
        };

        let fresh = svc.evaluate(&uid, &ctx).await.unwrap();
        let titles: Vec<_> = fresh.iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["First Steps", "Perfect Score"]);

        assert!(svc.evaluate(&uid, &ctx).await.unwrap().is_empty());

        let status = svc.catalog_with_status(&uid).await.unwrap();
        assert_eq!(status.len(), 6);
        let unlocked: Vec<_> = status
            .iter()
            .filter(|s| s.unlocked)
            .map(|s| s.achievement.id.as_str())
            .collect();
        assert_eq!(unlocked, vec!["1", "2"]);
    }
}
