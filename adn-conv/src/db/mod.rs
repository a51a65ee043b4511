//! Database access for adn-conv
//!
//! SQLite database in the root folder (`adn.db`).

pub mod jobs;

pub use jobs::SqliteJobStore;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

/// Connections shared by all concurrently running jobs
pub const POOL_MAX_CONNECTIONS: u32 = 8;

/// How long a connection waits on a locked database before SQLITE_BUSY
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// How long a caller waits for a free pool connection
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Open (or create) the database and ensure the schema exists
///
/// WAL keeps status reads from blocking job writes; the busy timeout makes
/// concurrent writers queue instead of failing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::debug!(
        "Connecting to database: {} ({} connections, busy_timeout={}ms)",
        db_path.display(),
        POOL_MAX_CONNECTIONS,
        BUSY_TIMEOUT.as_millis()
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(POOL_MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(db_path)
                .busy_timeout(BUSY_TIMEOUT)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .create_if_missing(true),
        )
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create adn-conv tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            progress INTEGER NOT NULL DEFAULT 0,
            current_step TEXT NOT NULL DEFAULT '',
            logs TEXT NOT NULL DEFAULT '[]',
            error TEXT,
            result_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (jobs)");

    Ok(())
}
