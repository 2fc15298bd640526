use hanzi_core::model::{CharacterId, GameSessionId, GameSessionRecord, User, UserId, UserProgress};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_from_str(raw: String) -> Result<UserId, StorageError> {
    UserId::new(raw).map_err(ser)
}

pub(crate) fn character_id_from_i64(v: i64) -> Result<CharacterId, StorageError> {
    Ok(CharacterId::new(i64_to_u32("character_id", v)?))
}

pub(crate) fn map_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, StorageError> {
    User::from_persisted(
        user_id_from_str(row.try_get("id").map_err(ser)?)?,
        row.try_get("name").map_err(ser)?,
        row.try_get("email").map_err(ser)?,
        row.try_get("avatar").map_err(ser)?,
        i64_to_u32("level", row.try_get("level").map_err(ser)?)?,
        i64_to_u64("experience", row.try_get("experience").map_err(ser)?)?,
        i64_to_u64("total_score", row.try_get("total_score").map_err(ser)?)?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("last_login_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<UserProgress, StorageError> {
    Ok(UserProgress {
        user_id: user_id_from_str(row.try_get("user_id").map_err(ser)?)?,
        character_id: character_id_from_i64(row.try_get("character_id").map_err(ser)?)?,
        attempts: i64_to_u32("attempts", row.try_get("attempts").map_err(ser)?)?,
        correct_attempts: i64_to_u32(
            "correct_attempts",
            row.try_get("correct_attempts").map_err(ser)?,
        )?,
        last_attempt_at: row.try_get("last_attempt_at").map_err(ser)?,
        mastered: row.try_get::<bool, _>("mastered").map_err(ser)?,
    })
}

/// Studied character ids are kept as a JSON array of integers.
pub(crate) fn encode_characters(ids: &[CharacterId]) -> Result<String, StorageError> {
    serde_json::to_string(ids).map_err(ser)
}

fn decode_characters(raw: &str) -> Result<Vec<CharacterId>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_session_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<GameSessionRecord, StorageError> {
    let studied: String = row.try_get("characters_studied").map_err(ser)?;
    Ok(GameSessionRecord {
        id: Some(GameSessionId::new(row.try_get("id").map_err(ser)?)),
        user_id: user_id_from_str(row.try_get("user_id").map_err(ser)?)?,
        characters_studied: decode_characters(&studied)?,
        score: i64_to_u64("score", row.try_get("score").map_err(ser)?)?,
        correct_answers: i64_to_u32(
            "correct_answers",
            row.try_get("correct_answers").map_err(ser)?,
        )?,
        total_questions: i64_to_u32(
            "total_questions",
            row.try_get("total_questions").map_err(ser)?,
        )?,
        time_spent_secs: i64_to_u64(
            "time_spent_secs",
            row.try_get("time_spent_secs").map_err(ser)?,
        )?,
        started_at: row.try_get("started_at").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}
