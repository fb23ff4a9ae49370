//! Durable single-slot credential storage.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    #[error("credential store query failed: {0}")]
    Query(String),
}

/// Durable, single-slot storage for the session's bearer credential.
///
/// One credential at a time: `set` replaces whatever was there, and an empty
/// slot is a normal state (`Ok(None)`), never an error.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the stored credential, if any.
    async fn get(&self) -> Result<Option<String>, StoreError>;

    /// Overwrite the slot with a new credential.
    async fn set(&self, token: &str) -> Result<(), StoreError>;

    /// Empty the slot. Idempotent.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// SQLite-backed credential store that survives process restarts.
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    db_path: PathBuf,

    /// Shared SQLite connection pool, initialized lazily so construction
    /// stays synchronous and a store that is never touched never creates a
    /// database file.
    pool: Arc<Mutex<Option<SqlitePool>>>,
}

impl SqliteCredentialStore {
    /// Store under the platform data directory
    /// (`{app_data_dir}/givehub/session.db`).
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::at_path(default_db_path()?))
    }

    /// Store under `{dir}/session.db`. Used when configuration overrides the
    /// data directory, and by tests.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at_path(dir.as_ref().join("session.db"))
    }

    fn at_path(db_path: PathBuf) -> Self {
        Self {
            db_path,
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Initialize the database connection (called lazily on first use).
    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        let mut pool_guard = self.pool.lock().await;
        if pool_guard.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                StoreError::Unavailable(format!(
                    "failed to create store directory at {:?}: {err}",
                    parent
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await.map_err(|err| {
            StoreError::Unavailable(format!(
                "failed to open credential store at {:?}: {err}",
                self.db_path
            ))
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credential (
                slot      INTEGER PRIMARY KEY CHECK (slot = 0),
                token     TEXT NOT NULL,
                stored_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|err| StoreError::Query(format!("failed to create credential table: {err}")))?;

        *pool_guard = Some(pool);
        Ok(())
    }

    /// Get the pool, initializing if necessary.
    async fn get_pool(&self) -> Result<SqlitePool, StoreError> {
        self.ensure_initialized().await?;
        let pool_guard = self.pool.lock().await;
        pool_guard
            .as_ref()
            .cloned()
            .ok_or_else(|| StoreError::Unavailable("credential store lost its pool".to_string()))
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        let pool = self.get_pool().await?;

        let row = sqlx::query("SELECT token FROM credential WHERE slot = 0")
            .fetch_optional(&pool)
            .await
            .map_err(|err| StoreError::Query(format!("failed to read credential: {err}")))?;

        match row {
            Some(row) => {
                let token: String = row
                    .try_get("token")
                    .map_err(|err| StoreError::Query(format!("bad credential row: {err}")))?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, token: &str) -> Result<(), StoreError> {
        let pool = self.get_pool().await?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO credential (slot, token, stored_at)
            VALUES (0, ?1, ?2)
            ON CONFLICT(slot)
            DO UPDATE SET
                token = excluded.token,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(token)
        .bind(&now)
        .execute(&pool)
        .await
        .map_err(|err| StoreError::Query(format!("failed to write credential: {err}")))?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let pool = self.get_pool().await?;

        sqlx::query("DELETE FROM credential")
            .execute(&pool)
            .await
            .map_err(|err| StoreError::Query(format!("failed to clear credential: {err}")))?;

        Ok(())
    }
}

/// In-memory credential store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.slot.lock().await.clone())
    }

    async fn set(&self, token: &str) -> Result<(), StoreError> {
        *self.slot.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().await = None;
        Ok(())
    }
}

/// Resolve the default store path: `{app_data_dir}/givehub/session.db`.
fn default_db_path() -> Result<PathBuf, StoreError> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut home| {
                home.push(".local");
                home.push("share");
                home
            })
        })
        .ok_or_else(|| {
            StoreError::Unavailable(
                "failed to resolve an app data directory - tried data_dir() and home_dir()/.local/share"
                    .to_string(),
            )
        })?;

    let mut dir = base;
    dir.push("givehub");
    dir.push("session.db");
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> SqliteCredentialStore {
        let dir = std::env::temp_dir().join(format!("givehub-store-{}", uuid::Uuid::new_v4()));
        SqliteCredentialStore::in_dir(dir)
    }

    #[tokio::test]
    async fn empty_slot_reads_as_none() {
        let store = temp_store();
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = temp_store();
        store.set("token-1").await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some("token-1".to_string()));
    }

    #[tokio::test]
    async fn set_replaces_the_previous_credential() {
        let store = temp_store();
        store.set("token-1").await.unwrap();
        store.set("token-2").await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some("token-2".to_string()));
    }

    #[tokio::test]
    async fn clear_empties_the_slot_and_is_idempotent() {
        let store = temp_store();
        store.set("token-1").await.unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);

        store.clear().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn credential_survives_a_second_store_instance() {
        let dir = std::env::temp_dir().join(format!("givehub-store-{}", uuid::Uuid::new_v4()));

        let first = SqliteCredentialStore::in_dir(&dir);
        first.set("persistent-token").await.unwrap();
        drop(first);

        let second = SqliteCredentialStore::in_dir(&dir);
        assert_eq!(
            second.get().await.unwrap(),
            Some("persistent-token".to_string())
        );
    }

    #[tokio::test]
    async fn memory_store_behaves_like_the_durable_one() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get().await.unwrap(), None);

        store.set("token-1").await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some("token-1".to_string()));

        store.clear().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
    }
}
