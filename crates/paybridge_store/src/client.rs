//! Embedded key-value store
//!
//! A single SQLite file holds named buckets, each bucket being a
//! `(namespace, collection)` pair with string keys and string values. Every
//! call runs in its own short transaction; WAL journaling lets readers proceed
//! while a writer commits, and SQLite serialises the writers.

use crate::error::StoreError;
use paybridge_config::StoreConfig;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

/// A nested collection inside a top-level namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bucket {
    pub namespace: &'static str,
    pub collection: &'static str,
}

impl Bucket {
    pub const fn new(namespace: &'static str, collection: &'static str) -> Self {
        Self {
            namespace,
            collection,
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.collection)
    }
}

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS buckets (
        namespace TEXT NOT NULL,
        collection TEXT NOT NULL,
        PRIMARY KEY (namespace, collection)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS entries (
        namespace TEXT NOT NULL,
        collection TEXT NOT NULL,
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        PRIMARY KEY (namespace, collection, key),
        FOREIGN KEY (namespace, collection) REFERENCES buckets (namespace, collection)
    )
    "#,
];

/// Handle to the open store. Cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct StoreClient {
    pool: SqlitePool,
}

impl StoreClient {
    /// Open the store described by `config` and make sure `buckets` exist.
    ///
    /// # Errors
    ///
    /// `StoreError::Unavailable` if the file cannot be created or opened, or if
    /// it stays locked for longer than `open_timeout_ms`.
    pub async fn open(config: &StoreConfig, buckets: &[Bucket]) -> Result<Self, StoreError> {
        if config.path.trim().is_empty() {
            return Err(StoreError::Config("store path is empty".to_string()));
        }
        if config.max_connections == 0 {
            return Err(StoreError::Config(
                "store max_connections must be at least 1".to_string(),
            ));
        }

        let open_timeout = Duration::from_millis(config.open_timeout_ms);
        let path = Path::new(&config.path);

        let opened = tokio::time::timeout(open_timeout, async {
            let client = Self::connect(path, open_timeout, config.max_connections).await?;
            client.init_schema().await?;
            for bucket in buckets {
                client
                    .ensure_bucket(*bucket)
                    .await
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            }
            Ok::<_, StoreError>(client)
        })
        .await;

        match opened {
            Ok(Ok(client)) => {
                info!("Store opened at {}", path.display());
                Ok(client)
            }
            Ok(Err(e)) => {
                error!("Failed to open store at {}: {}", path.display(), e);
                Err(e)
            }
            Err(_) => {
                error!(
                    "Timed out after {:?} opening store at {}",
                    open_timeout,
                    path.display()
                );
                Err(StoreError::Unavailable(format!(
                    "timed out after {:?} waiting for {}",
                    open_timeout,
                    path.display()
                )))
            }
        }
    }

    async fn connect(
        path: &Path,
        busy_timeout: Duration,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                debug!("Creating directory for store file: {:?}", dir);
                std::fs::create_dir_all(dir).map_err(|e| {
                    StoreError::Unavailable(format!("failed to create {}: {}", dir.display(), e))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .foreign_keys(true)
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(busy_timeout)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self { pool })
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Unavailable(format!("schema setup failed: {}", e)))?;
        }
        Ok(())
    }

    /// Create the namespace/collection pair if it does not exist yet.
    pub async fn ensure_bucket(&self, bucket: Bucket) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO buckets (namespace, collection) VALUES (?, ?) \
             ON CONFLICT (namespace, collection) DO NOTHING",
        )
        .bind(bucket.namespace)
        .bind(bucket.collection)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Write)?;

        debug!("Bucket {} ready", bucket);
        Ok(())
    }

    /// Look up `key`. `Ok(None)` means there is no value; errors are I/O only.
    pub async fn get(&self, bucket: Bucket, key: &str) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            "SELECT value FROM entries WHERE namespace = ? AND collection = ? AND key = ?",
        )
        .bind(bucket.namespace)
        .bind(bucket.collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Read)
    }

    /// Insert or overwrite the value stored under `key`.
    pub async fn put(&self, bucket: Bucket, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO entries (namespace, collection, key, value) VALUES (?, ?, ?, ?) \
             ON CONFLICT (namespace, collection, key) DO UPDATE SET value = excluded.value",
        )
        .bind(bucket.namespace)
        .bind(bucket.collection)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Write)?;
        Ok(())
    }

    /// Store `value` only if `key` has no value yet, and return whatever is
    /// stored once the transaction commits.
    pub async fn put_if_absent(
        &self,
        bucket: Bucket,
        key: &str,
        value: &str,
    ) -> Result<String, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::Write)?;

        sqlx::query(
            "INSERT INTO entries (namespace, collection, key, value) VALUES (?, ?, ?, ?) \
             ON CONFLICT (namespace, collection, key) DO NOTHING",
        )
        .bind(bucket.namespace)
        .bind(bucket.collection)
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::Write)?;

        let stored = sqlx::query_scalar::<_, String>(
            "SELECT value FROM entries WHERE namespace = ? AND collection = ? AND key = ?",
        )
        .bind(bucket.namespace)
        .bind(bucket.collection)
        .bind(key)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::Write)?;

        tx.commit().await.map_err(StoreError::Write)?;
        Ok(stored)
    }

    /// Check if the store answers a trivial query.
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Close every pooled connection. Later calls fail with a read/write error.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Store closed");
    }
}
