use std::sync::Arc;

use serde::Serialize;
use storage::repository::{StorageError, UserRepository};

use hanzi_core::GameRules;
use hanzi_core::model::{
    ANONYMOUS_NAME, ExternalProfile, GUEST_NAME, LevelChange, NewUser, User, UserId, UserUpdate,
};

use crate::Clock;
use crate::error::UserServiceError;

/// Updated profile after an experience gain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperienceGain {
    pub user: User,
    pub level_change: LevelChange,
}

/// Profile creation, login and experience bookkeeping.
#[derive(Clone)]
pub struct UserService {
    clock: Clock,
    rules: GameRules,
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(clock: Clock, rules: GameRules, users: Arc<dyn UserRepository>) -> Self {
        Self {
            clock,
            rules,
            users,
        }
    }

    /// Create a fresh level-1 user with a random id.
    ///
    /// A missing name becomes `"Anonymous User"` and a missing email is empty.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if persistence fails.
    pub async fn create_user(&self, request: NewUser) -> Result<User, UserServiceError> {
        let user = User::new(
            UserId::generate(),
            non_blank(request.name).unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
            request.email.unwrap_or_default(),
            request.avatar,
            self.clock.now(),
        );
        self.users.upsert_user(&user).await?;
        tracing::info!(user_id = %user.id, "created user");
        Ok(user)
    }

    /// Log in as a guest, creating the profile on first use.
    ///
    /// An existing profile keeps its progress and only has `last_login_at`
    /// refreshed. A new one is named `name`, or `"Guest User"`.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if persistence fails.
    pub async fn login_guest(
        &self,
        user_id: Option<UserId>,
        name: Option<String>,
    ) -> Result<User, UserServiceError> {
        let now = self.clock.now();
        if let Some(id) = &user_id {
            if self.users.get_user(id).await?.is_some() {
                let user = self
                    .users
                    .update_user(id, &UserUpdate::default(), now)
                    .await?;
                tracing::debug!(user_id = %user.id, "guest login");
                return Ok(user);
            }
        }

        let user = User::new(
            user_id.unwrap_or_else(UserId::generate),
            non_blank(name).unwrap_or_else(|| GUEST_NAME.to_string()),
            String::new(),
            None,
            now,
        );
        self.users.upsert_user(&user).await?;
        tracing::info!(user_id = %user.id, "created guest user");
        Ok(user)
    }

    /// Log in with an identity from an external provider.
    ///
    /// Returning users keep level, experience and score while their name,
    /// email and avatar follow the provider.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if persistence fails.
    pub async fn login_external(&self, profile: ExternalProfile) -> Result<User, UserServiceError> {
        let now = self.clock.now();
        let user = match self.users.get_user(&profile.id).await? {
            Some(mut existing) => {
                existing.refresh_from_profile(&profile, now);
                existing
            }
            None => {
                tracing::info!(user_id = %profile.id, "first external login");
                User::new(
                    profile.id.clone(),
                    profile.name.clone(),
                    profile.email.clone(),
                    profile.avatar.clone(),
                    now,
                )
            }
        };
        self.users.upsert_user(&user).await?;
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::NotFound` if the user does not exist.
    pub async fn get_user(&self, user_id: &UserId) -> Result<User, UserServiceError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(user_id.clone()))
    }

    /// Apply a partial update. `last_login_at` is always refreshed.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::NotFound` if the user does not exist.
    pub async fn update_user(
        &self,
        user_id: &UserId,
        update: &UserUpdate,
    ) -> Result<User, UserServiceError> {
        self.users
            .update_user(user_id, update, self.clock.now())
            .await
            .map_err(|err| match err {
                StorageError::NotFound => UserServiceError::NotFound(user_id.clone()),
                other => UserServiceError::Storage(other),
            })
    }

    /// Add experience (and the same amount of score) and recompute the level.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::NotFound` if the user does not exist.
    /// Returns `UserServiceError::Storage` if persistence fails.
    pub async fn add_experience(
        &self,
        user_id: &UserId,
        amount: u64,
    ) -> Result<ExperienceGain, UserServiceError> {
        let mut user = self.get_user(user_id).await?;
        let level_change = user.add_experience(amount, &self.rules);

        self.users.add_experience(user_id, amount).await?;
        if level_change.leveled_up() {
            self.users.set_level(user_id, level_change.to).await?;
            tracing::info!(
                user_id = %user_id,
                from = level_change.from,
                to = level_change.to,
                "level up"
            );
        }
        self.users.upsert_user(&user).await?;

        Ok(ExperienceGain { user, level_change })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanzi_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn service() -> UserService {
        UserService::new(
            fixed_clock(),
            GameRules::default(),
            Arc::new(InMemoryRepository::new()),
        )
    }

    #[tokio::test]
    async fn create_user_applies_defaults() {
        let svc = service();
        let user = svc.create_user(NewUser::default()).await.unwrap();
        assert_eq!(user.name, ANONYMOUS_NAME);
        assert_eq!(user.email, "");
        assert_eq!(user.level, 1);
        assert_eq!(user.experience, 0);
        assert_eq!(user.total_score, 0);
        assert_eq!(user.created_at, fixed_now());

        let fetched = svc.get_user(&user.id).await.unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn guest_login_reuses_existing_profile() {
        let svc = service();
        let id = UserId::new("guest-1").unwrap();
        let first = svc.login_guest(Some(id.clone()), None).await.unwrap();
        assert_eq!(first.name, GUEST_NAME);

        svc.add_experience(&id, 300).await.unwrap();
        let again = svc
            .login_guest(Some(id.clone()), Some("学习者".into()))
            .await
            .unwrap();
        assert_eq!(again.experience, 300);
        assert_eq!(again.name, GUEST_NAME);
    }

    #[tokio::test]
    async fn external_login_refreshes_identity_only() {
        let svc = service();
        let profile = ExternalProfile {
            id: UserId::new("google-42").unwrap(),
            name: "Li".into(),
            email: "li@example.com".into(),
            avatar: None,
        };
        svc.login_external(profile.clone()).await.unwrap();
        svc.add_experience(&profile.id, 1_500).await.unwrap();

        let renamed = ExternalProfile {
            name: "Li Wei".into(),
            avatar: Some("https://example.com/li.png".into()),
            ..profile
        };
        let user = svc.login_external(renamed).await.unwrap();
        assert_eq!(user.name, "Li Wei");
        assert_eq!(user.level, 2);
        assert_eq!(user.experience, 1_500);
        assert_eq!(user.total_score, 1_500);
    }

    #[tokio::test]
    async fn add_experience_reports_level_change() {
        let svc = service();
        let user = svc.login_guest(None, None).await.unwrap();

        let gain = svc.add_experience(&user.id, 900).await.unwrap();
        assert!(!gain.level_change.leveled_up());

        let gain = svc.add_experience(&user.id, 200).await.unwrap();
        assert!(gain.level_change.leveled_up());
        assert_eq!(gain.level_change.to, 2);

        let stored = svc.get_user(&user.id).await.unwrap();
        assert_eq!(stored.experience, 1_100);
        assert_eq!(stored.total_score, 1_100);
        assert_eq!(stored.level, 2);
    }

    #[tokio::test]
    async fn missing_users_are_reported() {
        let svc = service();
        let ghost = UserId::new("ghost").unwrap();
        assert!(matches!(
            svc.get_user(&ghost).await,
            Err(UserServiceError::NotFound(_))
        ));
        assert!(matches!(
            svc.update_user(&ghost, &UserUpdate::default()).await,
            Err(UserServiceError::NotFound(_))
        ));
        assert!(matches!(
            svc.add_experience(&ghost, 10).await,
            Err(UserServiceError::NotFound(_))
        ));
    }
}
