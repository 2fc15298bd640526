use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hanzi_core::model::{
    AchievementId, CharacterId, GameSessionId, GameSessionRecord, User, UserId, UserProgress,
    UserUpdate,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// User profiles, keyed by id.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or replace a user profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn upsert_user(&self, user: &User) -> Result<(), StorageError>;

    /// Fetch a user by id, `None` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StorageError>;

    /// Apply a partial update and return the stored result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn update_user(
        &self,
        id: &UserId,
        update: &UserUpdate,
        now: DateTime<Utc>,
    ) -> Result<User, StorageError>;

    /// Atomically add to the stored experience.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn add_experience(&self, id: &UserId, delta: u64) -> Result<(), StorageError>;

    /// Overwrite the stored level.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn set_level(&self, id: &UserId, level: u32) -> Result<(), StorageError>;
}

/// Per-character answer history, keyed by `(user_id, character_id)`.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Insert or replace progress entries. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any entry cannot be stored.
    async fn upsert_progress(&self, entries: &[UserProgress]) -> Result<(), StorageError>;

    /// All progress for a user, ordered by character id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn list_progress(&self, user_id: &UserId) -> Result<Vec<UserProgress>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn get_progress(
        &self,
        user_id: &UserId,
        character_id: CharacterId,
    ) -> Result<Option<UserProgress>, StorageError>;
}

/// The set of unlocked achievement ids per user.
#[async_trait]
pub trait AchievementRepository: Send + Sync {
    /// Replace the user's unlocked set. Repeated ids are kept once, at
    /// their first position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be stored.
    async fn save_unlocked(
        &self,
        user_id: &UserId,
        unlocked: &[AchievementId],
    ) -> Result<(), StorageError>;

    /// Unlocked ids in the order they were saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn list_unlocked(&self, user_id: &UserId) -> Result<Vec<AchievementId>, StorageError>;
}

/// Played game sessions.
#[async_trait]
pub trait GameSessionRepository: Send + Sync {
    /// Store a new session and return its id. Any id on the record is ignored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn append_session(
        &self,
        session: &GameSessionRecord,
    ) -> Result<GameSessionId, StorageError>;

    /// Overwrite a previously appended session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record has no id or no such
    /// session exists.
    async fn update_session(&self, session: &GameSessionRecord) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist.
    async fn get_session(&self, id: GameSessionId) -> Result<GameSessionRecord, StorageError>;

    /// Most recent sessions first (by `started_at`, then id).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn list_sessions(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<GameSessionRecord>, StorageError>;

    /// Completed sessions with `completed_at >= since`, latest completion first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn list_completed_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<GameSessionRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
    progress: Arc<Mutex<HashMap<(UserId, CharacterId), UserProgress>>>,
    achievements: Arc<Mutex<HashMap<UserId, Vec<AchievementId>>>>,
    sessions: Arc<Mutex<BTreeMap<i64, GameSessionRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        lock(&self.users)?.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        Ok(lock(&self.users)?.get(id).cloned())
    }

    async fn update_user(
        &self,
        id: &UserId,
        update: &UserUpdate,
        now: DateTime<Utc>,
    ) -> Result<User, StorageError> {
        let mut guard = lock(&self.users)?;
        let user = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        user.apply_update(update, now);
        Ok(user.clone())
    }

    async fn add_experience(&self, id: &UserId, delta: u64) -> Result<(), StorageError> {
        let mut guard = lock(&self.users)?;
        let user = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        user.experience = user.experience.saturating_add(delta);
        Ok(())
    }

    async fn set_level(&self, id: &UserId, level: u32) -> Result<(), StorageError> {
        let mut guard = lock(&self.users)?;
        let user = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        user.level = level.max(1);
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn upsert_progress(&self, entries: &[UserProgress]) -> Result<(), StorageError> {
        let mut guard = lock(&self.progress)?;
        for entry in entries {
            guard.insert(
                (entry.user_id.clone(), entry.character_id),
                entry.clone(),
            );
        }
        Ok(())
    }

    async fn list_progress(&self, user_id: &UserId) -> Result<Vec<UserProgress>, StorageError> {
        let guard = lock(&self.progress)?;
        let mut out: Vec<UserProgress> = guard
            .values()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|p| p.character_id);
        Ok(out)
    }

    async fn get_progress(
        &self,
        user_id: &UserId,
        character_id: CharacterId,
    ) -> Result<Option<UserProgress>, StorageError> {
        let guard = lock(&self.progress)?;
        Ok(guard.get(&(user_id.clone(), character_id)).cloned())
    }
}

#[async_trait]
impl AchievementRepository for InMemoryRepository {
    async fn save_unlocked(
        &self,
        user_id: &UserId,
        unlocked: &[AchievementId],
    ) -> Result<(), StorageError> {
        let mut set: Vec<AchievementId> = Vec::with_capacity(unlocked.len());
        for id in unlocked {
            if !set.contains(id) {
                set.push(id.clone());
            }
        }
        lock(&self.achievements)?.insert(user_id.clone(), set);
        Ok(())
    }

    async fn list_unlocked(&self, user_id: &UserId) -> Result<Vec<AchievementId>, StorageError> {
        Ok(lock(&self.achievements)?
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl GameSessionRepository for InMemoryRepository {
    async fn append_session(
        &self,
        session: &GameSessionRecord,
    ) -> Result<GameSessionId, StorageError> {
        let mut guard = lock(&self.sessions)?;
        let next = guard.keys().next_back().map_or(1, |last| last + 1);
        let mut stored = session.clone();
        stored.id = Some(GameSessionId::new(next));
        guard.insert(next, stored);
        Ok(GameSessionId::new(next))
    }

    async fn update_session(&self, session: &GameSessionRecord) -> Result<(), StorageError> {
        let id = session.id.ok_or(StorageError::NotFound)?;
        let mut guard = lock(&self.sessions)?;
        let slot = guard.get_mut(&id.value()).ok_or(StorageError::NotFound)?;
        *slot = session.clone();
        Ok(())
    }

    async fn get_session(&self, id: GameSessionId) -> Result<GameSessionRecord, StorageError> {
        lock(&self.sessions)?
            .get(&id.value())
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_sessions(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<GameSessionRecord>, StorageError> {
        let guard = lock(&self.sessions)?;
        let mut out: Vec<GameSessionRecord> = guard
            .values()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }

    async fn list_completed_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<GameSessionRecord>, StorageError> {
        let guard = lock(&self.sessions)?;
        let mut out: Vec<GameSessionRecord> = guard
            .values()
            .filter(|s| &s.user_id == user_id && s.completed_at.is_some_and(|t| t >= since))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.completed_at
                .cmp(&a.completed_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(out)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub achievements: Arc<dyn AchievementRepository>,
    pub sessions: Arc<dyn GameSessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Uses one repository value for every collection.
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: UserRepository
            + ProgressRepository
            + AchievementRepository
            + GameSessionRepository
            + Clone
            + 'static,
    {
        Self {
            users: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            achievements: Arc::new(repo.clone()),
            sessions: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hanzi_core::time::fixed_now;

    fn user(id: &str) -> User {
        User::new(UserId::new(id).unwrap(), "Tester", "t@example.com", None, fixed_now())
    }

    fn session(user_id: &UserId, minutes: i64) -> GameSessionRecord {
        GameSessionRecord {
            id: None,
            user_id: user_id.clone(),
            characters_studied: vec![CharacterId::new(1)],
            score: 100,
            correct_answers: 1,
            total_questions: 1,
            time_spent_secs: 30,
            started_at: fixed_now() + Duration::minutes(minutes),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn update_user_applies_partial_fields() {
        let repo = InMemoryRepository::new();
        let u = user("u1");
        repo.upsert_user(&u).await.unwrap();

        let later = fixed_now() + Duration::minutes(5);
        let updated = repo
            .update_user(
                &u.id,
                &UserUpdate {
                    total_score: Some(300),
                    ..UserUpdate::default()
                },
                later,
            )
            .await
            .unwrap();
        assert_eq!(updated.total_score, 300);
        assert_eq!(updated.experience, 0);
        assert_eq!(updated.last_login_at, later);

        let missing = UserId::new("nobody").unwrap();
        let err = repo
            .update_user(&missing, &UserUpdate::default(), later)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn experience_increment_and_level() {
        let repo = InMemoryRepository::new();
        let u = user("u1");
        repo.upsert_user(&u).await.unwrap();
        repo.add_experience(&u.id, 700).await.unwrap();
        repo.add_experience(&u.id, 700).await.unwrap();
        repo.set_level(&u.id, 2).await.unwrap();

        let stored = repo.get_user(&u.id).await.unwrap().unwrap();
        assert_eq!(stored.experience, 1400);
        assert_eq!(stored.level, 2);
    }

    #[tokio::test]
    async fn progress_is_last_write_wins() {
        let repo = InMemoryRepository::new();
        let uid = UserId::new("u1").unwrap();
        let mut p = UserProgress::first_attempt(uid.clone(), CharacterId::new(9), true, fixed_now());
        repo.upsert_progress(std::slice::from_ref(&p)).await.unwrap();
        p.record_attempt(true, fixed_now(), 3);
        repo.upsert_progress(std::slice::from_ref(&p)).await.unwrap();

        let all = repo.list_progress(&uid).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].attempts, 2);
        assert!(
            repo.get_progress(&uid, CharacterId::new(10))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn sessions_list_newest_first() {
        let repo = InMemoryRepository::new();
        let uid = UserId::new("u1").unwrap();
        let first = repo.append_session(&session(&uid, 0)).await.unwrap();
        let second = repo.append_session(&session(&uid, 10)).await.unwrap();
        assert_ne!(first, second);

        let listed = repo.list_sessions(&uid, 10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, Some(second));

        let limited = repo.list_sessions(&uid, 1).await.unwrap();
        assert_eq!(limited.len(), 1);

        let mut done = repo.get_session(first).await.unwrap();
        done.completed_at = Some(fixed_now() + Duration::minutes(1));
        repo.update_session(&done).await.unwrap();
        assert!(repo.get_session(first).await.unwrap().is_completed());
    }

    #[tokio::test]
    async fn achievements_replace_whole_set() {
        let repo = InMemoryRepository::new();
        let uid = UserId::new("u1").unwrap();
        assert!(repo.list_unlocked(&uid).await.unwrap().is_empty());

        repo.save_unlocked(&uid, &[AchievementId::new("1")])
            .await
            .unwrap();
        repo.save_unlocked(&uid, &[AchievementId::new("1"), AchievementId::new("2")])
            .await
            .unwrap();
        assert_eq!(repo.list_unlocked(&uid).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn repeated_achievement_ids_are_stored_once() {
        let repo = InMemoryRepository::new();
        let uid = UserId::new("u1").unwrap();
        repo.save_unlocked(
            &uid,
            &[
                AchievementId::new("2"),
                AchievementId::new("1"),
                AchievementId::new("2"),
            ],
        )
        .await
        .unwrap();
        assert_eq!(
            repo.list_unlocked(&uid).await.unwrap(),
            vec![AchievementId::new("2"), AchievementId::new("1")]
        );
    }

    #[tokio::test]
    async fn completed_since_skips_open_and_older_sessions() {
        let repo = InMemoryRepository::new();
        let uid = UserId::new("u1").unwrap();
        let other = UserId::new("u2").unwrap();

        let mut old = session(&uid, -3 * 24 * 60);
        old.completed_at = Some(old.started_at + Duration::minutes(1));
        repo.append_session(&old).await.unwrap();
        repo.append_session(&session(&uid, 0)).await.unwrap();
        let mut recent = session(&uid, 5);
        recent.completed_at = Some(recent.started_at + Duration::minutes(1));
        let recent_id = repo.append_session(&recent).await.unwrap();
        let mut foreign = session(&other, 5);
        foreign.completed_at = recent.completed_at;
        repo.append_session(&foreign).await.unwrap();

        let since = fixed_now() - Duration::days(1);
        let listed = repo.list_completed_since(&uid, since).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, Some(recent_id));

        let all = repo
            .list_completed_since(&uid, fixed_now() - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, Some(recent_id));
    }
}
