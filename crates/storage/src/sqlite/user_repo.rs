use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hanzi_core::model::{User, UserId, UserUpdate};
use sqlx::{Sqlite, Transaction};

use super::{
    SqliteRepository,
    mapping::{conn, map_user_row, u64_to_i64},
};
use crate::repository::{StorageError, UserRepository};

const SELECT_USER: &str = r"
    SELECT id, name, email, avatar, level, experience, total_score, created_at, last_login_at
    FROM users
    WHERE id = ?1
";

async fn write_user(tx: &mut Transaction<'_, Sqlite>, user: &User) -> Result<(), StorageError> {
    sqlx::query(
        r"
        INSERT INTO users (
            id, name, email, avatar, level, experience, total_score,
            created_at, last_login_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            email = excluded.email,
            avatar = excluded.avatar,
            level = excluded.level,
            experience = excluded.experience,
            total_score = excluded.total_score,
            created_at = excluded.created_at,
            last_login_at = excluded.last_login_at,
            updated_at = excluded.updated_at
        ",
    )
    .bind(user.id.as_str())
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.avatar.as_deref())
    .bind(i64::from(user.level))
    .bind(u64_to_i64("experience", user.experience)?)
    .bind(u64_to_i64("total_score", user.total_score)?)
    .bind(user.created_at)
    .bind(user.last_login_at)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await
    .map_err(conn)?;
    Ok(())
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        write_user(&mut tx, user).await?;
        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(SELECT_USER)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_user_row).transpose()
    }

    async fn update_user(
        &self,
        id: &UserId,
        update: &UserUpdate,
        now: DateTime<Utc>,
    ) -> Result<User, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        let row = sqlx::query(SELECT_USER)
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;
        let mut user = map_user_row(&row)?;
        user.apply_update(update, now);
        write_user(&mut tx, &user).await?;
        tx.commit().await.map_err(conn)?;
        Ok(user)
    }

    async fn add_experience(&self, id: &UserId, delta: u64) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE users
            SET experience = experience + ?2, updated_at = ?3
            WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .bind(u64_to_i64("experience", delta)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn set_level(&self, id: &UserId, level: u32) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE users SET level = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id.as_str())
            .bind(i64::from(level.max(1)))
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
