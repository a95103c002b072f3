use sqlx::Row;
use vocab_core::model::{User, UserId};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, ser, user_id_from_i64};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn register_user(&self, user: &User) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO users (user_id, username, first_name, last_name, registered_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(user_id) DO NOTHING
            ",
        )
        .bind(id_i64("user_id", user.id.value())?)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.registered_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.rows_affected() == 1)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT user_id, username, first_name, last_name, registered_at
                FROM users
                WHERE user_id = ?1
            ",
        )
        .bind(id_i64("user_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(User {
            id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
            username: row.try_get("username").map_err(ser)?,
            first_name: row.try_get("first_name").map_err(ser)?,
            last_name: row.try_get("last_name").map_err(ser)?,
            registered_at: row.try_get("registered_at").map_err(ser)?,
        }))
    }
}
