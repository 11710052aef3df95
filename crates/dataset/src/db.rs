//! Database connection and pool management.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::schema::Schema;

// Lookups are short, read-only and independent of each other.
pub const MAX_CONNECTIONS: u32 = 5;

/// Read-only connection pool for the reference dataset.
///
/// This is the main entry point for interacting with the dataset. The schema
/// is discovered (bound) exactly once while connecting, and the resulting
/// [`Schema`] is shared by every repository created from this handle.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    schema: Arc<Schema>,
}

impl Database {
    async fn new(options: SqliteConnectOptions, max: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // This is IMPORTANT to apply the query-based PRAGMAs to EVERY
            // connection (set by max connections) instead of only the
            // first connection returned by the pool.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .max_connections(max.max(1))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let schema = {
            let mut conn = pool.acquire().await.or_raise(|| ErrorKind::Database)?;
            Schema::bind(&mut *conn).await?
        };
        Ok(Self { pool, schema: Arc::new(schema) })
    }

    /// Connect to the reference dataset at the given path.
    ///
    /// The file is opened read-only and is never created; a missing dataset
    /// is a [`ErrorKind::Database`] error. Binding the schema happens before
    /// this returns, so a successful connection is ready to serve lookups.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>, max_connections: Option<u32>) -> Result<Self> {
        let options = Self::base_options().filename(path.as_ref());
        Self::new(options, max_connections.unwrap_or(MAX_CONNECTIONS)).await
    }

    /// Base connection options for the (immutable) dataset.
    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .read_only(true)
            .create_if_missing(false)
            // Nothing ever writes, so there is no lock to wait for in
            // practice; keep a short timeout in case an external build is
            // still finishing with the file.
            .busy_timeout(std::time::Duration::from_millis(1500))
    }

    /// Apply additional PRAGMA settings that aren't exposed via SqliteConnectOptions.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA query_only = ON;
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
                PRAGMA mmap_size = 33554432;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The entity layout discovered when connecting.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Close the database connection pool.
    ///
    /// This waits for all connections to be returned to the pool and then
    /// closes them. After calling this, the Database instance should not
    /// be used.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Dataset;

    #[tokio::test]
    async fn test_connect() {
        let dataset = Dataset::sample().await;
        let db = Database::connect(dataset.path(), None).await.unwrap();
        assert!(!db.pool().is_closed());
        db.close().await;
        assert!(db.pool().is_closed());
    }

    #[tokio::test]
    async fn test_missing_dataset_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");
        let err = Database::connect(&path, None).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Database);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_connection_is_read_only() {
        let dataset = Dataset::sample().await;
        let db = Database::connect(dataset.path(), Some(1)).await.unwrap();
        let result = sqlx::query("DELETE FROM MFG").execute(db.pool()).await;
        assert!(result.is_err());
        let row: (i64,) = sqlx::query_as("PRAGMA query_only").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, 1, "query_only should be ON");
        db.close().await;
    }
}
