//! Exception row operations.
//!
//! Reads return only live rows (`deleted_at IS NULL`) unless the function
//! name says otherwise. The `status` column is written by [`set_status`]
//! from the lifecycle engine, and by the bulk importer after it has replayed
//! the ledger; both run inside the transaction that writes the ledger.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteExecutor;

use polex_core::ExceptionId;
use polex_state::{Exception, ExceptionStatus, NewException};

use crate::error::StoreError;

/// Column list shared by every exception query.
pub(crate) const COLUMNS: &str = "id, username, submitted_date, start_date, end_date, service, \
     exception_type, detail, status, created_at, updated_at, deleted_at";

/// Insert a new exception with no recorded status.
pub async fn insert(
    executor: impl SqliteExecutor<'_>,
    new: &NewException,
    now: DateTime<Utc>,
) -> Result<ExceptionId, StoreError> {
    let result = sqlx::query(
        "INSERT INTO exceptions (username, submitted_date, start_date, end_date, service, \
         exception_type, detail, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&new.username)
    .bind(new.submitted_date)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(&new.service)
    .bind(&new.exception_type)
    .bind(&new.detail)
    .bind(ExceptionStatus::Unrecorded.as_str())
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(ExceptionId(result.last_insert_rowid()))
}

/// Fetch a live exception.
pub async fn get_live(
    executor: impl SqliteExecutor<'_>,
    id: ExceptionId,
) -> Result<Option<Exception>, StoreError> {
    let row = sqlx::query_as::<_, ExceptionRow>(&format!(
        "SELECT {COLUMNS} FROM exceptions WHERE id = ? AND deleted_at IS NULL"
    ))
    .bind(id.get())
    .fetch_optional(executor)
    .await?;

    row.map(ExceptionRow::into_record).transpose()
}

/// Fetch a live exception, failing with `NotFound` when absent.
pub async fn require_live(
    executor: impl SqliteExecutor<'_>,
    id: ExceptionId,
) -> Result<Exception, StoreError> {
    get_live(executor, id)
        .await?
        .ok_or_else(|| StoreError::not_found("exception", id))
}

/// Whether a live exception with this ID exists.
pub async fn exists_live(
    executor: impl SqliteExecutor<'_>,
    id: ExceptionId,
) -> Result<bool, StoreError> {
    let found: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM exceptions WHERE id = ? AND deleted_at IS NULL")
            .bind(id.get())
            .fetch_optional(executor)
            .await?;
    Ok(found.is_some())
}

/// Every exception including soft-deleted ones, by ID.
pub async fn all_including_deleted(
    executor: impl SqliteExecutor<'_>,
) -> Result<Vec<Exception>, StoreError> {
    let rows = sqlx::query_as::<_, ExceptionRow>(&format!(
        "SELECT {COLUMNS} FROM exceptions ORDER BY id"
    ))
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(ExceptionRow::into_record).collect()
}

/// Overwrite the cached status. Fails if the row is not live.
pub async fn set_status(
    executor: impl SqliteExecutor<'_>,
    id: ExceptionId,
    status: ExceptionStatus,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        "UPDATE exceptions SET status = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(status.as_str())
    .bind(now)
    .bind(id.get())
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("exception", id));
    }
    Ok(())
}

/// Set the soft-delete marker on a live exception.
pub async fn soft_delete(
    executor: impl SqliteExecutor<'_>,
    id: ExceptionId,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        "UPDATE exceptions SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(now)
    .bind(id.get())
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("exception", id));
    }
    Ok(())
}

/// Insert or overwrite an exception row, keeping the given ID.
///
/// The cached status is written as given; the importer passes the status
/// reconstructed from the ledger, never the one found in the document.
pub async fn upsert(
    executor: impl SqliteExecutor<'_>,
    exception: &Exception,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO exceptions (id, username, submitted_date, start_date, end_date, service, \
         exception_type, detail, status, created_at, updated_at, deleted_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (id) DO UPDATE SET \
         username = excluded.username, submitted_date = excluded.submitted_date, \
         start_date = excluded.start_date, end_date = excluded.end_date, \
         service = excluded.service, exception_type = excluded.exception_type, \
         detail = excluded.detail, status = excluded.status, \
         created_at = excluded.created_at, updated_at = excluded.updated_at, \
         deleted_at = excluded.deleted_at",
    )
    .bind(exception.id.get())
    .bind(&exception.username)
    .bind(exception.submitted_date)
    .bind(exception.start_date)
    .bind(exception.end_date)
    .bind(&exception.service)
    .bind(&exception.exception_type)
    .bind(&exception.detail)
    .bind(exception.status.as_str())
    .bind(exception.created_at)
    .bind(exception.updated_at)
    .bind(exception.deleted_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Overwrite the cached status of any row, live or soft-deleted, without
/// touching the ledger.
///
/// Only the importer calls this, inside its transaction and after replaying
/// the row's ledger, passing the status reconstructed from that ledger.
/// Every other status write goes through [`set_status`] from the lifecycle
/// engine.
pub(crate) async fn restore_status(
    executor: impl SqliteExecutor<'_>,
    id: ExceptionId,
    status: ExceptionStatus,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE exceptions SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id.get())
        .execute(executor)
        .await?;
    Ok(())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
pub(crate) struct ExceptionRow {
    id: i64,
    username: String,
    submitted_date: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    service: String,
    exception_type: String,
    detail: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ExceptionRow {
    pub(crate) fn into_record(self) -> Result<Exception, StoreError> {
        let status: ExceptionStatus =
            self.status.parse().map_err(|_| StoreError::Corrupt {
                entity: "exception",
                id: self.id,
                reason: format!("unknown status {:?}", self.status),
            })?;

        Ok(Exception {
            id: ExceptionId(self.id),
            username: self.username,
            submitted_date: self.submitted_date,
            start_date: self.start_date,
            end_date: self.end_date,
            service: self.service,
            exception_type: self.exception_type,
            detail: self.detail,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}
