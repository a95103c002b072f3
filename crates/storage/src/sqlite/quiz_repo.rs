use chrono::{DateTime, Utc};
use sqlx::Row;
use vocab_core::model::{QuestionResult, QuizSession, QuizStats, QuizTotals, SessionId, UserId};

use super::SqliteRepository;
use super::mapping::{
    conn, id_i64, map_result_row, map_session_row, ser, session_id_from_i64, u32_from_i64,
};
use crate::repository::{QuizRepository, StorageError};

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn create_session(
        &self,
        user_id: UserId,
        started_at: DateTime<Utc>,
    ) -> Result<SessionId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO quiz_sessions (user_id, started_at)
                VALUES (?1, ?2)
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(started_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        session_id_from_i64(res.last_insert_rowid())
    }

    async fn append_result(&self, result: &QuestionResult) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO question_results (
                    session_id, word, correct_answer, user_answer, is_correct, answered_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(id_i64("session_id", result.session_id.value())?)
        .bind(&result.word)
        .bind(&result.correct_answer)
        .bind(&result.user_answer)
        .bind(result.is_correct)
        .bind(result.answered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
            other => conn(other),
        })?;

        Ok(res.last_insert_rowid())
    }

    async fn finalize_session(
        &self,
        id: SessionId,
        totals: QuizTotals,
        ended_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let session_id = id_i64("session_id", id.value())?;
        let res = sqlx::query(
            r"
                UPDATE quiz_sessions
                SET ended_at = ?2,
                    total_questions = ?3,
                    correct_answers = ?4,
                    incorrect_answers = ?5
                WHERE session_id = ?1 AND ended_at IS NULL
            ",
        )
        .bind(session_id)
        .bind(ended_at)
        .bind(i64::from(totals.answered()))
        .bind(i64::from(totals.correct()))
        .bind(i64::from(totals.incorrect()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing updated: either the row is missing or it was already finalized.
        match self.get_session(id).await? {
            Some(_) => Err(StorageError::Conflict),
            None => Err(StorageError::NotFound),
        }
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    session_id, user_id, started_at, ended_at,
                    total_questions, correct_answers, incorrect_answers
                FROM quiz_sessions
                WHERE session_id = ?1
            ",
        )
        .bind(id_i64("session_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_session_row).transpose()
    }

    async fn results_for_session(
        &self,
        id: SessionId,
    ) -> Result<Vec<QuestionResult>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT session_id, word, correct_answer, user_answer, is_correct, answered_at
                FROM question_results
                WHERE session_id = ?1
                ORDER BY id ASC
            ",
        )
        .bind(id_i64("session_id", id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }

    async fn recent_sessions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuizSession>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    session_id, user_id, started_at, ended_at,
                    total_questions, correct_answers, incorrect_answers
                FROM quiz_sessions
                WHERE user_id = ?1
                ORDER BY started_at DESC, session_id DESC
                LIMIT ?2
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_session_row).collect()
    }

    async fn quiz_stats(&self, user_id: UserId) -> Result<QuizStats, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    COUNT(correct_answers) AS sessions,
                    AVG(correct_answers) AS average_correct,
                    MAX(correct_answers) AS best_correct
                FROM quiz_sessions
                WHERE user_id = ?1 AND ended_at IS NOT NULL
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let sessions = u32_from_i64("sessions", row.try_get::<i64, _>("sessions").map_err(ser)?)?;
        let average_correct = row
            .try_get::<Option<f64>, _>("average_correct")
            .map_err(ser)?
            .unwrap_or(0.0);
        let best_correct = row
            .try_get::<Option<i64>, _>("best_correct")
            .map_err(ser)?
            .map(|v| u32_from_i64("best_correct", v))
            .transpose()?
            .unwrap_or(0);

        Ok(QuizStats {
            sessions,
            average_correct,
            best_correct,
        })
    }
}
