// ABOUTME: Database connection management
// ABOUTME: Opens the SQLite pool with WAL and foreign keys enabled and applies embedded migrations

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::StorageError;

/// Connection settings for the SQLite pool
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: reqtrack_core::database_file(),
            max_connections: 10,
            busy_timeout: Duration::from_secs(30),
        }
    }
}

impl DatabaseConfig {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Open (creating if needed) the database file and run migrations
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, StorageError> {
    if let Some(parent) = config.path.parent() {
        std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
    }

    debug!("Connecting to database: {}", config.path.display());

    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .map_err(StorageError::Sqlx)?;

    info!("Database connection established");

    migrate(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database, used by tests and `--in-memory`
///
/// The pool is pinned to one connection that never expires because every
/// SQLite `:memory:` connection is its own database.
pub async fn connect_in_memory() -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(StorageError::Sqlx)?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(StorageError::Sqlx)?;

    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(StorageError::Migration)?;

    debug!("Database migrations completed");
    Ok(())
}
