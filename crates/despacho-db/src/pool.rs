//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  Engine Startup                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ Concurrent access from picking stations                        │
//! │       ▼                                                                 │
//! │  Scanner 1 ──► uses Conn1                                              │
//! │  Scanner 2 ──► uses Conn2                                              │
//! │  Listing   ──► uses Conn3                                              │
//! │  (Several scan guns can hit the same order at once)                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! The pool opens SQLite in WAL (Write-Ahead Logging) mode: a scan gun
//! writing its increment never blocks the listing screen's reads, and a
//! long detail read never blocks the next scan.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::assignment::AssignmentRepository;
use crate::repository::detail::DetailRepository;
use crate::repository::history::HistoryRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Pool and migration settings for one SQLite database.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/despacho/despacho.db")
///     .max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Where the SQLite file lives. Created on first connect.
    pub database_path: PathBuf,

    /// Pool ceiling. Default 5, enough for a handful of scan guns plus
    /// the listing screen.
    pub max_connections: u32,

    /// Connections kept warm. Default 1.
    pub min_connections: u32,

    /// How long an acquire may wait for a free connection. Default 30s.
    pub connect_timeout: Duration,

    /// Idle time before a pooled connection is dropped. Default 10 min.
    pub idle_timeout: Duration,

    /// Apply pending migrations during [`Database::new`]. Default true.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Configuration with defaults for the given database path.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = DbConfig::new("./data/despacho.db");
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the pool ceiling.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets how many connections stay warm.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enables or disables migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Configuration for an isolated in-memory database.
    ///
    /// Every test in this workspace that touches storage starts here: a
    /// fresh schema per test, nothing on disk.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            // A second connection would open a second, empty database.
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// ## Design
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  One handle, three repositories                                         │
/// │                                                                         │
/// │  Database                                                               │
/// │    ├── detail()       ← picking_detail rows (live worklist)            │
/// │    ├── history()      ← picking_history rows (archived worklist)       │
/// │    └── assignments()  ← picking_assignment rows (who + timing)         │
/// │                                                                         │
/// │  Repositories are cheap to construct (they clone the pool handle),     │
/// │  so callers grab them per operation instead of holding them.           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./despacho.db")).await?;
/// let lines = db.detail().list_for_order(&key).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and brings the schema up to date.
    ///
    /// ## What This Does
    /// 1. Opens (or creates) the SQLite file
    /// 2. Sets WAL journal mode, NORMAL synchronous, foreign keys ON
    /// 3. Builds the connection pool from the config limits
    /// 4. Applies pending migrations unless disabled
    ///
    /// ## Returns
    /// * `Ok(Database)` - Pool open, schema current
    /// * `Err(DbError)` - Connect or migration failure
    ///
    /// ## Example
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::new("./despacho.db")).await?;
    /// ```
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening picking database"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            // WAL: scan writes must not block listing reads
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite ships with foreign keys off
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.max_connections,
            "Connection pool ready"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations.
    ///
    /// Idempotent; called by [`new`](Self::new) unless the config disabled
    /// it, in which case the embedder calls this at a moment of its choosing.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// ## Usage
    /// For one-off queries the repositories do not cover. Prefer the
    /// repository methods when one exists.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the picking detail repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let lines = db.detail().list_for_order(&key).await?;
    /// ```
    pub fn detail(&self) -> DetailRepository {
        DetailRepository::new(self.pool.clone())
    }

    /// Returns the picking history repository.
    pub fn history(&self) -> HistoryRepository {
        HistoryRepository::new(self.pool.clone())
    }

    /// Returns the assignment repository.
    pub fn assignments(&self) -> AssignmentRepository {
        AssignmentRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Whether the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
