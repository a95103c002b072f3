use chrono::{DateTime, Utc};
use sqlx::Row;
use vocab_core::model::{UserId, WordPair, WordScope, normalize_key};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_word_row, ser};
use crate::repository::{StorageError, WordRepository};

#[async_trait::async_trait]
impl WordRepository for SqliteRepository {
    async fn add_user_word(
        &self,
        user_id: UserId,
        pair: &WordPair,
        added_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO user_words (user_id, english_word, russian_translation, added_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(user_id, english_word) DO NOTHING
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(pair.english())
        .bind(pair.russian())
        .bind(added_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.rows_affected() == 1)
    }

    async fn remove_user_word(&self, user_id: UserId, english: &str) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
                DELETE FROM user_words
                WHERE user_id = ?1 AND english_word = ?2
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(normalize_key(english))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.rows_affected() > 0)
    }

    async fn list_user_words(&self, user_id: UserId) -> Result<Vec<WordPair>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT english_word, russian_translation
                FROM user_words
                WHERE user_id = ?1
                ORDER BY added_at DESC, user_word_id DESC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_word_row).collect()
    }

    async fn list_default_words(&self, limit: u32) -> Result<Vec<WordPair>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT english_word, russian_translation
                FROM default_words
                ORDER BY word_id
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_word_row).collect()
    }

    async fn add_default_word(&self, pair: &WordPair) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO default_words (english_word, russian_translation)
                VALUES (?1, ?2)
                ON CONFLICT(english_word) DO NOTHING
            ",
        )
        .bind(pair.english())
        .bind(pair.russian())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.rows_affected() == 1)
    }

    async fn translation(
        &self,
        scope: WordScope,
        user_id: UserId,
        english: &str,
    ) -> Result<Option<String>, StorageError> {
        let key = normalize_key(english);
        let row = match scope {
            WordScope::Default => {
                sqlx::query(
                    r"
                        SELECT russian_translation
                        FROM default_words
                        WHERE english_word = ?1
                    ",
                )
                .bind(key)
                .fetch_optional(&self.pool)
                .await
            }
            WordScope::User => {
                sqlx::query(
                    r"
                        SELECT russian_translation
                        FROM user_words
                        WHERE user_id = ?1 AND english_word = ?2
                    ",
                )
                .bind(id_i64("user_id", user_id.value())?)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(conn)?;

        row.map(|r| r.try_get::<String, _>("russian_translation").map_err(ser))
            .transpose()
    }

    async fn translations_for(
        &self,
        user_id: UserId,
        english: &str,
    ) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT russian_translation FROM default_words WHERE english_word = ?2
                UNION
                SELECT russian_translation FROM user_words
                WHERE user_id = ?1 AND english_word = ?2
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(normalize_key(english))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("russian_translation").map_err(ser))
            .collect()
    }
}
