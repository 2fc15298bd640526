use async_trait::async_trait;
use chrono::Utc;
use hanzi_core::model::{CharacterId, UserId, UserProgress};

use super::{
    SqliteRepository,
    mapping::{conn, map_progress_row},
};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn upsert_progress(&self, entries: &[UserProgress]) -> Result<(), StorageError> {
        if entries.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(conn)?;
        for entry in entries {
            sqlx::query(
                r"
                INSERT INTO user_progress (
                    user_id, character_id, attempts, correct_attempts,
                    last_attempt_at, mastered, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(user_id, character_id) DO UPDATE SET
                    attempts = excluded.attempts,
                    correct_attempts = excluded.correct_attempts,
                    last_attempt_at = excluded.last_attempt_at,
                    mastered = excluded.mastered,
                    updated_at = excluded.updated_at
                ",
            )
            .bind(entry.user_id.as_str())
            .bind(i64::from(entry.character_id.value()))
            .bind(i64::from(entry.attempts))
            .bind(i64::from(entry.correct_attempts))
            .bind(entry.last_attempt_at)
            .bind(entry.mastered)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }
        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn list_progress(&self, user_id: &UserId) -> Result<Vec<UserProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, character_id, attempts, correct_attempts, last_attempt_at, mastered
            FROM user_progress
            WHERE user_id = ?1
            ORDER BY character_id ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_progress_row).collect()
    }

    async fn get_progress(
        &self,
        user_id: &UserId,
        character_id: CharacterId,
    ) -> Result<Option<UserProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, character_id, attempts, correct_attempts, last_attempt_at, mastered
            FROM user_progress
            WHERE user_id = ?1 AND character_id = ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(character_id.value()))
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;
        row.as_ref().map(map_progress_row).transpose()
    }
}
