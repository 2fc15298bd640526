use async_trait::async_trait;
use hanzi_core::model::{AchievementId, UserId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{conn, ser},
};
use crate::repository::{AchievementRepository, StorageError};

#[async_trait]
impl AchievementRepository for SqliteRepository {
    async fn save_unlocked(
        &self,
        user_id: &UserId,
        unlocked: &[AchievementId],
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        sqlx::query("DELETE FROM user_achievements WHERE user_id = ?1")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, id) in unlocked.iter().enumerate() {
            let position = i64::try_from(position).map_err(ser)?;
            sqlx::query(
                r"
                INSERT INTO user_achievements (user_id, achievement_id, position)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(user_id, achievement_id) DO NOTHING
                ",
            )
            .bind(user_id.as_str())
            .bind(id.as_str())
            .bind(position)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn list_unlocked(&self, user_id: &UserId) -> Result<Vec<AchievementId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT achievement_id
            FROM user_achievements
            WHERE user_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                let raw: String = row.try_get("achievement_id").map_err(ser)?;
                Ok(AchievementId::new(raw))
            })
            .collect()
    }
}
