//! # Database Persistence Layer
//!
//! SQLite persistence via SQLx. Each command invocation opens one pool,
//! performs its operation and exits; there is no long-running server.
//!
//! ## Tables
//!
//! - `exceptions`: aggregate root, with the cached `status` column and the
//!   `deleted_at` soft-delete marker.
//! - `status_changes`: append-only status ledger.
//! - `comments`, `form_files`: append-only children.
//!
//! Row-level functions live in the submodules and take any
//! [`SqliteExecutor`](sqlx::SqliteExecutor), so the same query runs
//! against the pool or inside a transaction.

pub mod comments;
pub mod exceptions;
pub mod form_files;
pub mod status_changes;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::StoreError;

/// Tables dropped by [`destroy_schema`], children first.
const TABLES: &[&str] = &[
    "form_files",
    "comments",
    "status_changes",
    "exceptions",
    "_sqlx_migrations",
];

/// Open a pool for a connection string.
///
/// `target` is either a `sqlite:` URL or a plain filename. The database
/// file is created if it does not exist.
pub async fn connect(target: &str) -> Result<SqlitePool, StoreError> {
    let options = if target.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(target)?
    } else {
        SqliteConnectOptions::new().filename(target)
    };
    open(options.create_if_missing(true)).await
}

/// Open a private in-memory database with the schema applied.
pub async fn connect_in_memory() -> Result<SqlitePool, StoreError> {
    let pool = open(SqliteConnectOptions::from_str("sqlite::memory:")?).await?;
    migrate(&pool).await?;
    Ok(pool)
}

async fn open(options: SqliteConnectOptions) -> Result<SqlitePool, StoreError> {
    // An in-memory database lives and dies with its connection, so the
    // pool holds exactly one and never recycles it.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect_with(options.foreign_keys(true))
        .await?;
    tracing::debug!("connected to SQLite");
    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}

/// Drop every table, including the migration bookkeeping.
pub async fn destroy_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;
    for table in TABLES {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    tracing::warn!("all exception tables dropped");
    Ok(())
}
