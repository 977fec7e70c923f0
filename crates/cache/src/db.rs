//! Database connection and pool management.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Embedded migrations that are run automatically on connect.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
// Imports are sequential, so this mostly serves concurrent readers.
const MAX_CONNECTIONS: u32 = 4;

/// Connection pool for the package store.
///
/// Hand a reference to [`Repository::from`](crate::Repository) to run
/// queries against it.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the store at the given path.
    ///
    /// Creates the database file (and its parent directory) if it doesn't
    /// exist and runs migrations.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Database)?;
        }
        let options = Self::options().filename(path).create_if_missing(true);
        Self::open(options, MAX_CONNECTIONS).await
    }

    /// Connect to an in-memory database.
    ///
    /// Not behind `#[cfg(test)]`: the library crate's tests use it too.
    pub async fn connect_in_memory() -> Result<Self> {
        // Every connection to `:memory:` is a separate, empty database, so
        // the pool must never open a second one.
        Self::open(Self::options().filename(":memory:"), 1).await
    }

    async fn open(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // Query-based PRAGMAs are per connection; run them on each one
            // the pool opens, not just the first.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    fn options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            // Readers (listing packages) keep working while a scan writes.
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            // Package files and images cascade from packages.
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_millis(1500))
    }

    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA wal_autocheckpoint = 1000;
                PRAGMA cache_size = -4096;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Apply any migrations that haven't run yet. Called on connect.
    #[instrument("applying package store migrations", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    /// The underlying pool, for queries outside [`Repository`](crate::Repository).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool once all connections are returned.
    ///
    /// The owner calls this when it is done with the store (for the CLI,
    /// after the command finishes); the instance is unusable afterwards.
    pub async fn close(&self) {
        // Refresh query planner statistics on the way out.
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
