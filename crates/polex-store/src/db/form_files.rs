//! Form file row operations.
//!
//! Listing reads only metadata; the contents are fetched one file at a
//! time.

use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;

use polex_core::{ExceptionId, FormFileId};
use polex_state::{FormFile, FormFileInfo};

use crate::error::StoreError;

/// Store an attachment.
pub async fn insert(
    executor: impl SqliteExecutor<'_>,
    exception_id: ExceptionId,
    file_name: &str,
    contents: &[u8],
    at: DateTime<Utc>,
) -> Result<FormFileId, StoreError> {
    let result = sqlx::query(
        "INSERT INTO form_files (exception_id, file_name, contents, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(exception_id.get())
    .bind(file_name)
    .bind(contents)
    .bind(at)
    .execute(executor)
    .await?;

    Ok(FormFileId(result.last_insert_rowid()))
}

/// Store an attachment under its original ID. Existing IDs are left alone.
pub async fn insert_preserving_id(
    executor: impl SqliteExecutor<'_>,
    file: &FormFile,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "INSERT INTO form_files (id, exception_id, file_name, contents, created_at) \
         VALUES (?, ?, ?, ?, ?) ON CONFLICT (id) DO NOTHING",
    )
    .bind(file.id.get())
    .bind(file.exception_id.get())
    .bind(&file.file_name)
    .bind(&file.contents)
    .bind(file.created_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Exception that owns the attachment with this ID, if it exists.
pub async fn owner(
    executor: impl SqliteExecutor<'_>,
    id: FormFileId,
) -> Result<Option<ExceptionId>, StoreError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT exception_id FROM form_files WHERE id = ?")
        .bind(id.get())
        .fetch_optional(executor)
        .await?;
    Ok(row.map(|(owner,)| ExceptionId(owner)))
}

/// Metadata for every attachment of one exception, oldest first.
pub async fn info_for_exception(
    executor: impl SqliteExecutor<'_>,
    exception_id: ExceptionId,
) -> Result<Vec<FormFileInfo>, StoreError> {
    let rows = sqlx::query_as::<_, FormFileInfoRow>(
        "SELECT id, exception_id, file_name, length(contents) AS size, created_at \
         FROM form_files WHERE exception_id = ? ORDER BY created_at, id",
    )
    .bind(exception_id.get())
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(FormFileInfoRow::into_record).collect())
}

/// Metadata for every attachment on a live exception.
pub async fn info_all_live(
    executor: impl SqliteExecutor<'_>,
) -> Result<Vec<FormFileInfo>, StoreError> {
    let rows = sqlx::query_as::<_, FormFileInfoRow>(
        "SELECT f.id, f.exception_id, f.file_name, length(f.contents) AS size, f.created_at \
         FROM form_files f JOIN exceptions e ON e.id = f.exception_id \
         WHERE e.deleted_at IS NULL ORDER BY f.id",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(FormFileInfoRow::into_record).collect())
}

/// One attachment with its contents, if its exception is live.
pub async fn get(
    executor: impl SqliteExecutor<'_>,
    id: FormFileId,
) -> Result<Option<FormFile>, StoreError> {
    let row = sqlx::query_as::<_, FormFileRow>(
        "SELECT f.id, f.exception_id, f.file_name, f.contents, f.created_at \
         FROM form_files f JOIN exceptions e ON e.id = f.exception_id \
         WHERE f.id = ? AND e.deleted_at IS NULL",
    )
    .bind(id.get())
    .fetch_optional(executor)
    .await?;

    Ok(row.map(FormFileRow::into_record))
}

/// Every attachment with contents, grouped by exception.
pub async fn all(executor: impl SqliteExecutor<'_>) -> Result<Vec<FormFile>, StoreError> {
    let rows = sqlx::query_as::<_, FormFileRow>(
        "SELECT id, exception_id, file_name, contents, created_at FROM form_files \
         ORDER BY exception_id, created_at, id",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(FormFileRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct FormFileRow {
    id: i64,
    exception_id: i64,
    file_name: String,
    contents: Vec<u8>,
    created_at: DateTime<Utc>,
}

impl FormFileRow {
    fn into_record(self) -> FormFile {
        FormFile {
            id: FormFileId(self.id),
            exception_id: ExceptionId(self.exception_id),
            file_name: self.file_name,
            contents: self.contents,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FormFileInfoRow {
    id: i64,
    exception_id: i64,
    file_name: String,
    size: i64,
    created_at: DateTime<Utc>,
}

impl FormFileInfoRow {
    fn into_record(self) -> FormFileInfo {
        FormFileInfo {
            id: FormFileId(self.id),
            exception_id: ExceptionId(self.exception_id),
            file_name: self.file_name,
            size: self.size,
            created_at: self.created_at,
        }
    }
}
