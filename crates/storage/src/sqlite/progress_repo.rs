use chrono::{DateTime, Utc};
use sqlx::Row;
use vocab_core::model::{LeaderboardEntry, UserId, WordProgress, WordScope, normalize_key};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, parse_scope, ser, u32_from_i64, user_id_from_i64};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn add_to_leaderboard(
        &self,
        user_id: UserId,
        correct: u32,
        incorrect: u32,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO leaderboard (user_id, total_tests, total_correct, total_incorrect, last_test)
                VALUES (?1, 1, ?2, ?3, ?4)
                ON CONFLICT(user_id) DO UPDATE SET
                    total_tests = leaderboard.total_tests + 1,
                    total_correct = leaderboard.total_correct + excluded.total_correct,
                    total_incorrect = leaderboard.total_incorrect + excluded.total_incorrect,
                    last_test = excluded.last_test
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(i64::from(correct))
        .bind(i64::from(incorrect))
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn leaderboard_entry(
        &self,
        user_id: UserId,
    ) -> Result<Option<LeaderboardEntry>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT user_id, total_tests, total_correct, total_incorrect, last_test
                FROM leaderboard
                WHERE user_id = ?1
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(LeaderboardEntry {
            user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
            total_tests: u32_from_i64("total_tests", row.try_get("total_tests").map_err(ser)?)?,
            total_correct: u32_from_i64(
                "total_correct",
                row.try_get("total_correct").map_err(ser)?,
            )?,
            total_incorrect: u32_from_i64(
                "total_incorrect",
                row.try_get("total_incorrect").map_err(ser)?,
            )?,
            last_test: row.try_get("last_test").map_err(ser)?,
        }))
    }

    async fn record_word_progress(
        &self,
        user_id: UserId,
        english: &str,
        scope: WordScope,
        correct: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO user_progress (
                    user_id, english_word, word_type, times_shown, times_correct, last_shown
                )
                VALUES (?1, ?2, ?3, 1, ?4, ?5)
                ON CONFLICT(user_id, english_word, word_type) DO UPDATE SET
                    times_shown = user_progress.times_shown + 1,
                    times_correct = user_progress.times_correct + excluded.times_correct,
                    last_shown = excluded.last_shown
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(normalize_key(english))
        .bind(scope.as_str())
        .bind(i64::from(correct))
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn word_progress(
        &self,
        user_id: UserId,
        english: &str,
        scope: WordScope,
    ) -> Result<Option<WordProgress>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT user_id, english_word, word_type, times_shown, times_correct, last_shown
                FROM user_progress
                WHERE user_id = ?1 AND english_word = ?2 AND word_type = ?3
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(normalize_key(english))
        .bind(scope.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let word_type: String = row.try_get("word_type").map_err(ser)?;
        Ok(Some(WordProgress {
            user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
            english: row.try_get("english_word").map_err(ser)?,
            scope: parse_scope(&word_type)?,
            times_shown: u32_from_i64("times_shown", row.try_get("times_shown").map_err(ser)?)?,
            times_correct: u32_from_i64(
                "times_correct",
                row.try_get("times_correct").map_err(ser)?,
            )?,
            last_shown: row.try_get("last_shown").map_err(ser)?,
        }))
    }
}
