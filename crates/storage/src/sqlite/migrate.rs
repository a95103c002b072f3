use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;
use crate::repository::DEFAULT_WORDS;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates users, both word lists, quiz sessions with their results, the
/// leaderboard and per-word progress, then seeds the shared word list.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema and default words.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS users (
                    user_id INTEGER PRIMARY KEY,
                    username TEXT NOT NULL DEFAULT '',
                    first_name TEXT NOT NULL DEFAULT '',
                    last_name TEXT NOT NULL DEFAULT '',
                    registered_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS default_words (
                    word_id INTEGER PRIMARY KEY,
                    english_word TEXT NOT NULL UNIQUE,
                    russian_translation TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS user_words (
                    user_word_id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    english_word TEXT NOT NULL,
                    russian_translation TEXT NOT NULL,
                    added_at TEXT NOT NULL,
                    UNIQUE (user_id, english_word),
                    FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quiz_sessions (
                    session_id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    started_at TEXT NOT NULL,
                    ended_at TEXT,
                    total_questions INTEGER CHECK (total_questions >= 0),
                    correct_answers INTEGER CHECK (correct_answers >= 0),
                    incorrect_answers INTEGER CHECK (incorrect_answers >= 0),
                    CHECK ((ended_at IS NULL) = (total_questions IS NULL)),
                    FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS question_results (
                    id INTEGER PRIMARY KEY,
                    session_id INTEGER NOT NULL,
                    word TEXT NOT NULL,
                    correct_answer TEXT NOT NULL,
                    user_answer TEXT NOT NULL,
                    is_correct INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
                    answered_at TEXT NOT NULL,
                    FOREIGN KEY (session_id) REFERENCES quiz_sessions(session_id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS leaderboard (
                    user_id INTEGER PRIMARY KEY,
                    total_tests INTEGER NOT NULL DEFAULT 0 CHECK (total_tests >= 0),
                    total_correct INTEGER NOT NULL DEFAULT 0 CHECK (total_correct >= 0),
                    total_incorrect INTEGER NOT NULL DEFAULT 0 CHECK (total_incorrect >= 0),
                    last_test TEXT,
                    FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS user_progress (
                    user_id INTEGER NOT NULL,
                    english_word TEXT NOT NULL,
                    word_type TEXT NOT NULL CHECK (word_type IN ('default', 'user')),
                    times_shown INTEGER NOT NULL CHECK (times_shown >= 0),
                    times_correct INTEGER NOT NULL CHECK (times_correct >= 0),
                    last_shown TEXT NOT NULL,
                    PRIMARY KEY (user_id, english_word, word_type),
                    FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_user_words_user_added
                    ON user_words (user_id, added_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_quiz_sessions_user_started
                    ON quiz_sessions (user_id, started_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_question_results_session
                    ON question_results (session_id, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        for (english, russian) in DEFAULT_WORDS {
            sqlx::query(
                r"
                    INSERT INTO default_words (english_word, russian_translation)
                    VALUES (?1, ?2)
                    ON CONFLICT(english_word) DO NOTHING
                ",
            )
            .bind(*english)
            .bind(*russian)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
