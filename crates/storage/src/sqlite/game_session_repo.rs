use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hanzi_core::model::{GameSessionId, GameSessionRecord, UserId};

use super::{
    SqliteRepository,
    mapping::{conn, encode_characters, map_session_row, u64_to_i64},
};
use crate::repository::{GameSessionRepository, StorageError};

const SESSION_COLUMNS: &str = "id, user_id, characters_studied, score, correct_answers, \
     total_questions, time_spent_secs, started_at, completed_at";

#[async_trait]
impl GameSessionRepository for SqliteRepository {
    async fn append_session(
        &self,
        session: &GameSessionRecord,
    ) -> Result<GameSessionId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO game_sessions (
                user_id, characters_studied, score, correct_answers, total_questions,
                time_spent_secs, started_at, completed_at, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(session.user_id.as_str())
        .bind(encode_characters(&session.characters_studied)?)
        .bind(u64_to_i64("score", session.score)?)
        .bind(i64::from(session.correct_answers))
        .bind(i64::from(session.total_questions))
        .bind(u64_to_i64("time_spent_secs", session.time_spent_secs)?)
        .bind(session.started_at)
        .bind(session.completed_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(GameSessionId::new(res.last_insert_rowid()))
    }

    async fn update_session(&self, session: &GameSessionRecord) -> Result<(), StorageError> {
        let id = session.id.ok_or(StorageError::NotFound)?;
        let res = sqlx::query(
            r"
            UPDATE game_sessions
            SET user_id = ?2,
                characters_studied = ?3,
                score = ?4,
                correct_answers = ?5,
                total_questions = ?6,
                time_spent_secs = ?7,
                started_at = ?8,
                completed_at = ?9
            WHERE id = ?1
            ",
        )
        .bind(id.value())
        .bind(session.user_id.as_str())
        .bind(encode_characters(&session.characters_studied)?)
        .bind(u64_to_i64("score", session.score)?)
        .bind(i64::from(session.correct_answers))
        .bind(i64::from(session.total_questions))
        .bind(u64_to_i64("time_spent_secs", session.time_spent_secs)?)
        .bind(session.started_at)
        .bind(session.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_session(&self, id: GameSessionId) -> Result<GameSessionRecord, StorageError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM game_sessions WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;
        map_session_row(&row)
    }

    async fn list_sessions(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<GameSessionRecord>, StorageError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM game_sessions \
             WHERE user_id = ?1 \
             ORDER BY started_at DESC, id DESC \
             LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.as_str())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        rows.iter().map(map_session_row).collect()
    }

    async fn list_completed_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<GameSessionRecord>, StorageError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM game_sessions \
             WHERE user_id = ?1 AND completed_at IS NOT NULL AND completed_at >= ?2 \
             ORDER BY completed_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.as_str())
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        rows.iter().map(map_session_row).collect()
    }
}
