use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;
use crate::rules::GameRules;

pub const GUEST_NAME: &str = "Guest User";
pub const ANONYMOUS_NAME: &str = "Anonymous User";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("level must be at least 1")]
    InvalidLevel,
    #[error("last_login_at is before created_at")]
    InvalidTimeRange,
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

/// A learner profile with cumulative experience and score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub level: u32,
    pub experience: u64,
    pub total_score: u64,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

/// Level before and after an experience gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelChange {
    pub from: u32,
    pub to: u32,
}

impl LevelChange {
    #[must_use]
    pub fn leveled_up(&self) -> bool {
        self.to > self.from
    }
}

impl User {
    /// A fresh level-1 profile.
    #[must_use]
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        avatar: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            avatar,
            level: 1,
            experience: 0,
            total_score: 0,
            created_at: now,
            last_login_at: now,
        }
    }

    /// Rehydrate a user from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the level is zero or the timestamps are inverted.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: UserId,
        name: String,
        email: String,
        avatar: Option<String>,
        level: u32,
        experience: u64,
        total_score: u64,
        created_at: DateTime<Utc>,
        last_login_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        if level == 0 {
            return Err(UserError::InvalidLevel);
        }
        if last_login_at < created_at {
            return Err(UserError::InvalidTimeRange);
        }
        Ok(Self {
            id,
            name,
            email,
            avatar,
            level,
            experience,
            total_score,
            created_at,
            last_login_at,
        })
    }

    /// Adds experience (and the same amount to the total score) and
    /// recomputes the level.
    pub fn add_experience(&mut self, amount: u64, rules: &GameRules) -> LevelChange {
        let from = self.level;
        self.experience = self.experience.saturating_add(amount);
        self.total_score = self.total_score.saturating_add(amount);
        self.level = rules.level_for(self.experience);
        LevelChange {
            from,
            to: self.level,
        }
    }

    /// Applies a partial update. `last_login_at` is always refreshed.
    pub fn apply_update(&mut self, update: &UserUpdate, now: DateTime<Utc>) {
        if let Some(experience) = update.experience {
            self.experience = experience;
        }
        if let Some(level) = update.level {
            self.level = level.max(1);
        }
        if let Some(total_score) = update.total_score {
            self.total_score = total_score;
        }
        if let Some(name) = &update.name {
            self.name.clone_from(name);
        }
        if let Some(email) = &update.email {
            self.email.clone_from(email);
        }
        if let Some(avatar) = &update.avatar {
            self.avatar = Some(avatar.clone());
        }
        self.last_login_at = now.max(self.created_at);
    }

    /// Refreshes identity fields from an external provider on login.
    pub fn refresh_from_profile(&mut self, profile: &ExternalProfile, now: DateTime<Utc>) {
        self.name.clone_from(&profile.name);
        self.email.clone_from(&profile.email);
        self.avatar.clone_from(&profile.avatar);
        self.last_login_at = now.max(self.created_at);
    }
}

//
// ─── INPUTS ────────────────────────────────────────────────────────────────────
//

/// Request to create a user through the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

/// Identity returned by an external sign-in provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// Partial user update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub experience: Option<u64>,
    pub level: Option<u32>,
    pub total_score: Option<u64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}
