use certify_core::model::Credentials;
use chrono::Utc;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::ser;
use crate::repository::{CredentialStore, StorageError};

#[async_trait::async_trait]
impl CredentialStore for SqliteRepository {
    async fn load_credentials(&self) -> Result<Option<Credentials>, StorageError> {
        let row = sqlx::query("SELECT access_token, refresh_token FROM credentials WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let credentials = Credentials::new(
            row.try_get::<String, _>("access_token").map_err(ser)?,
            row.try_get::<String, _>("refresh_token").map_err(ser)?,
        );
        // A half-written pair is as good as none.
        Ok(credentials.is_complete().then_some(credentials))
    }

    async fn save_credentials(&self, credentials: &Credentials) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO credentials (id, access_token, refresh_token, saved_at)
                VALUES (1, ?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    access_token = excluded.access_token,
                    refresh_token = excluded.refresh_token,
                    saved_at = excluded.saved_at
            ",
        )
        .bind(credentials.access_token())
        .bind(credentials.refresh_token())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn clear_credentials(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM credentials")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
