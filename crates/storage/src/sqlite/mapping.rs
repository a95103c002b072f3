use sqlx::Row;
use vocab_core::model::{
    QuestionResult, QuizSession, QuizTotals, SessionId, UserId, WordPair, WordScope,
};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn session_id_from_i64(v: i64) -> Result<SessionId, StorageError> {
    Ok(SessionId::new(i64_to_u64("session_id", v)?))
}

pub(crate) fn parse_scope(s: &str) -> Result<WordScope, StorageError> {
    WordScope::parse(s).map_err(ser)
}

pub(crate) fn map_word_row(row: &sqlx::sqlite::SqliteRow) -> Result<WordPair, StorageError> {
    let english: String = row.try_get("english_word").map_err(ser)?;
    let russian: String = row.try_get("russian_translation").map_err(ser)?;
    WordPair::new(english, russian).map_err(ser)
}

pub(crate) fn map_session_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizSession, StorageError> {
    let id = session_id_from_i64(row.try_get::<i64, _>("session_id").map_err(ser)?)?;
    let user_id = user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?;
    let started_at = row.try_get("started_at").map_err(ser)?;
    let ended_at = row.try_get("ended_at").map_err(ser)?;

    let total: Option<i64> = row.try_get("total_questions").map_err(ser)?;
    let correct: Option<i64> = row.try_get("correct_answers").map_err(ser)?;
    let incorrect: Option<i64> = row.try_get("incorrect_answers").map_err(ser)?;
    let totals = match (total, correct, incorrect) {
        (Some(t), Some(c), Some(i)) => Some(
            QuizTotals::from_persisted(
                u32_from_i64("total_questions", t)?,
                u32_from_i64("correct_answers", c)?,
                u32_from_i64("incorrect_answers", i)?,
            )
            .map_err(ser)?,
        ),
        (None, None, None) => None,
        _ => return Err(StorageError::Serialization("partial session totals".into())),
    };

    QuizSession::from_persisted(id, user_id, started_at, ended_at, totals).map_err(ser)
}

pub(crate) fn map_result_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuestionResult, StorageError> {
    Ok(QuestionResult {
        session_id: session_id_from_i64(row.try_get::<i64, _>("session_id").map_err(ser)?)?,
        word: row.try_get("word").map_err(ser)?,
        correct_answer: row.try_get("correct_answer").map_err(ser)?,
        user_answer: row.try_get("user_answer").map_err(ser)?,
        is_correct: row.try_get("is_correct").map_err(ser)?,
        answered_at: row.try_get("answered_at").map_err(ser)?,
    })
}
