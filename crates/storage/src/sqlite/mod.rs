use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{AttemptLogRepository, CredentialStore, Storage, StorageError};
use crate::rest::ApiClient;

mod attempt_log_repo;
mod credential_repo;
mod mapping;
mod migrate;

/// Local `SQLite` store for saved credentials and the attempt history.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Client(#[from] StorageError),
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or if
    /// connection pragmas fail during setup.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA foreign_keys = ON;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Remote API for assessment data, local `SQLite` for tokens and history.
    ///
    /// Previously saved credentials are loaded into the client so the first
    /// request is already authenticated.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or migrated,
    /// or the HTTP client cannot be built.
    pub async fn remote(api_url: &str, database_url: &str) -> Result<Self, SqliteInitError> {
        let local = SqliteRepository::connect(database_url).await?;
        local.migrate().await?;

        let credentials: Arc<dyn CredentialStore> = Arc::new(local.clone());
        let attempt_log: Arc<dyn AttemptLogRepository> = Arc::new(local);
        let client = ApiClient::new(api_url)?.with_credential_store(credentials.clone());
        client.set_credentials(credentials.load_credentials().await?);

        Ok(Self {
            assessments: Arc::new(client.clone()),
            questions: Arc::new(client.clone()),
            sessions: Arc::new(client.clone()),
            users: Arc::new(client.clone()),
            auth: Arc::new(client),
            credentials,
            attempt_log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }
}
