use std::sync::Arc;

use serde::{Deserialize, Serialize};

use hanzi_core::model::{AchievementId, User, UserId, UserProgress};
use storage::repository::{
    AchievementRepository, ProgressRepository, StorageError, UserRepository,
};

/// Everything stored for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub user: Option<User>,
    pub progress: Vec<UserProgress>,
    pub unlocked_achievements: Vec<AchievementId>,
}

/// Bulk save and load of a user's profile, progress and achievements.
#[derive(Clone)]
pub struct SyncService {
    users: Arc<dyn UserRepository>,
    progress: Arc<dyn ProgressRepository>,
    achievements: Arc<dyn AchievementRepository>,
}

impl SyncService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        progress: Arc<dyn ProgressRepository>,
        achievements: Arc<dyn AchievementRepository>,
    ) -> Self {
        Self {
            users,
            progress,
            achievements,
        }
    }

    /// Write the snapshot. A snapshot without a user writes nothing; empty
    /// progress and achievement lists leave the stored ones untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on the first write that fails.
    pub async fn sync(&self, snapshot: &UserSnapshot) -> Result<(), StorageError> {
        let Some(user) = &snapshot.user else {
            return Ok(());
        };

        self.users.upsert_user(user).await?;
        if !snapshot.progress.is_empty() {
            self.progress.upsert_progress(&snapshot.progress).await?;
        }
        if !snapshot.unlocked_achievements.is_empty() {
            self.achievements
                .save_unlocked(&user.id, &snapshot.unlocked_achievements)
                .await?;
        }
        tracing::debug!(
            user_id = %user.id,
            progress = snapshot.progress.len(),
            achievements = snapshot.unlocked_achievements.len(),
            "synced user snapshot"
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    pub async fn load(&self, user_id: &UserId) -> Result<UserSnapshot, StorageError> {
        Ok(UserSnapshot {
            user: self.users.get_user(user_id).await?,
            progress: self.progress.list_progress(user_id).await?,
            unlocked_achievements: self.achievements.list_unlocked(user_id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanzi_core::model::CharacterId;
    use hanzi_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn service(repo: &InMemoryRepository) -> SyncService {
        SyncService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test]
    async fn sync_then_load_roundtrips() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let uid = UserId::new("u1").unwrap();
        let snapshot = UserSnapshot {
            user: Some(User::new(uid.clone(), "Mei", "mei@example.com", None, fixed_now())),
            progress: vec![UserProgress::first_attempt(
                uid.clone(),
                CharacterId::new(2),
                true,
                fixed_now(),
            )],
            unlocked_achievements: vec![AchievementId::new("1")],
        };

        svc.sync(&snapshot).await.unwrap();
        assert_eq!(svc.load(&uid).await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn empty_lists_keep_stored_data() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let uid = UserId::new("u1").unwrap();
        repo.save_unlocked(&uid, &[AchievementId::new("2")])
            .await
            .unwrap();

        let snapshot = UserSnapshot {
            user: Some(User::new(uid.clone(), "Mei", "", None, fixed_now())),
            progress: Vec::new(),
            unlocked_achievements: Vec::new(),
        };
        svc.sync(&snapshot).await.unwrap();

        let loaded = svc.load(&uid).await.unwrap();
        assert!(loaded.user.is_some());
        assert_eq!(loaded.unlocked_achievements, vec![AchievementId::new("2")]);
    }

    #[tokio::test]
    async fn load_of_unknown_user_is_empty() {
        let repo = InMemoryRepository::new();
        let loaded = service(&repo)
            .load(&UserId::new("nobody").unwrap())
            .await
            .unwrap();
        assert!(loaded.user.is_none());
        assert!(loaded.progress.is_empty());
        assert!(loaded.unlocked_achievements.is_empty());
    }
}
