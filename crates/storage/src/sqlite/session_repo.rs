use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{SessionKey, SessionRepository, StorageError};

use super::SqliteRepository;

#[async_trait]
impl SessionRepository for SqliteRepository {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM session_state WHERE key = ?1")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: String = row
            .try_get("value")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        Ok(Some(value))
    }

    async fn set(&self, key: SessionKey, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO session_state (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key.as_str())
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn remove(&self, key: SessionKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_state WHERE key = ?1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
