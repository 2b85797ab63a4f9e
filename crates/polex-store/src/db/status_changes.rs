//! Status ledger row operations.
//!
//! The ledger is append-only: there is an insert and there are reads,
//! nothing else.

use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;

use polex_core::{ExceptionId, StatusChangeId};
use polex_state::{ExceptionStatus, StatusChange};

use crate::error::StoreError;

const COLUMNS: &str = "id, exception_id, old_status, new_status, changer, created_at";

/// Append one ledger entry.
pub async fn insert(
    executor: impl SqliteExecutor<'_>,
    exception_id: ExceptionId,
    old_status: ExceptionStatus,
    new_status: ExceptionStatus,
    changer: &str,
    at: DateTime<Utc>,
) -> Result<StatusChangeId, StoreError> {
    let result = sqlx::query(
        "INSERT INTO status_changes (exception_id, old_status, new_status, changer, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(exception_id.get())
    .bind(old_status.as_str())
    .bind(new_status.as_str())
    .bind(changer)
    .bind(at)
    .execute(executor)
    .await?;

    Ok(StatusChangeId(result.last_insert_rowid()))
}

/// Append a ledger entry carrying its original ID, as found in an import
/// document. Returns `false` when an entry with that ID already exists; the
/// existing entry is left untouched.
pub async fn insert_preserving_id(
    executor: impl SqliteExecutor<'_>,
    change: &StatusChange,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "INSERT INTO status_changes (id, exception_id, old_status, new_status, changer, created_at) \
         VALUES (?, ?, ?, ?, ?, ?) ON CONFLICT (id) DO NOTHING",
    )
    .bind(change.id.get())
    .bind(change.exception_id.get())
    .bind(change.old_status.as_str())
    .bind(change.new_status.as_str())
    .bind(&change.changer)
    .bind(change.created_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Exception that owns the ledger entry with this ID, if it exists.
pub async fn owner(
    executor: impl SqliteExecutor<'_>,
    id: StatusChangeId,
) -> Result<Option<ExceptionId>, StoreError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT exception_id FROM status_changes WHERE id = ?")
        .bind(id.get())
        .fetch_optional(executor)
        .await?;
    Ok(row.map(|(owner,)| ExceptionId(owner)))
}

/// All entries for one exception, oldest first.
pub async fn for_exception(
    executor: impl SqliteExecutor<'_>,
    exception_id: ExceptionId,
) -> Result<Vec<StatusChange>, StoreError> {
    let rows = sqlx::query_as::<_, StatusChangeRow>(&format!(
        "SELECT {COLUMNS} FROM status_changes WHERE exception_id = ? ORDER BY created_at, id"
    ))
    .bind(exception_id.get())
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(StatusChangeRow::into_record).collect()
}

/// Every ledger entry, grouped by exception then oldest first.
pub async fn all(executor: impl SqliteExecutor<'_>) -> Result<Vec<StatusChange>, StoreError> {
    let rows = sqlx::query_as::<_, StatusChangeRow>(&format!(
        "SELECT {COLUMNS} FROM status_changes ORDER BY exception_id, created_at, id"
    ))
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(StatusChangeRow::into_record).collect()
}

/// Number of entries for one exception.
pub async fn count_for(
    executor: impl SqliteExecutor<'_>,
    exception_id: ExceptionId,
) -> Result<i64, StoreError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM status_changes WHERE exception_id = ?")
            .bind(exception_id.get())
            .fetch_one(executor)
            .await?;
    Ok(count)
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct StatusChangeRow {
    id: i64,
    exception_id: i64,
    old_status: String,
    new_status: String,
    changer: String,
    created_at: DateTime<Utc>,
}

impl StatusChangeRow {
    fn into_record(self) -> Result<StatusChange, StoreError> {
        let parse = |s: &str| -> Result<ExceptionStatus, StoreError> {
            s.parse().map_err(|_| StoreError::Corrupt {
                entity: "status change",
                id: self.id,
                reason: format!("unknown status {s:?}"),
            })
        };

        Ok(StatusChange {
            id: StatusChangeId(self.id),
            exception_id: ExceptionId(self.exception_id),
            old_status: parse(&self.old_status)?,
            new_status: parse(&self.new_status)?,
            changer: self.changer,
            created_at: self.created_at,
        })
    }
}
