//! Comment row operations.

use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;

use polex_core::{CommentId, ExceptionId};
use polex_state::Comment;

use crate::error::StoreError;

/// Append a comment.
pub async fn insert(
    executor: impl SqliteExecutor<'_>,
    exception_id: ExceptionId,
    author: &str,
    text: &str,
    at: DateTime<Utc>,
) -> Result<CommentId, StoreError> {
    let result = sqlx::query(
        "INSERT INTO comments (exception_id, author, text, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(exception_id.get())
    .bind(author)
    .bind(text)
    .bind(at)
    .execute(executor)
    .await?;

    Ok(CommentId(result.last_insert_rowid()))
}

/// Append a comment under its original ID. Existing IDs are left alone.
pub async fn insert_preserving_id(
    executor: impl SqliteExecutor<'_>,
    comment: &Comment,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "INSERT INTO comments (id, exception_id, author, text, created_at) \
         VALUES (?, ?, ?, ?, ?) ON CONFLICT (id) DO NOTHING",
    )
    .bind(comment.id.get())
    .bind(comment.exception_id.get())
    .bind(&comment.author)
    .bind(&comment.text)
    .bind(comment.created_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Exception that owns the comment with this ID, if it exists.
pub async fn owner(
    executor: impl SqliteExecutor<'_>,
    id: CommentId,
) -> Result<Option<ExceptionId>, StoreError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT exception_id FROM comments WHERE id = ?")
        .bind(id.get())
        .fetch_optional(executor)
        .await?;
    Ok(row.map(|(owner,)| ExceptionId(owner)))
}

/// Comments on one exception, oldest first.
pub async fn for_exception(
    executor: impl SqliteExecutor<'_>,
    exception_id: ExceptionId,
) -> Result<Vec<Comment>, StoreError> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT id, exception_id, author, text, created_at FROM comments \
         WHERE exception_id = ? ORDER BY created_at, id",
    )
    .bind(exception_id.get())
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(CommentRow::into_record).collect())
}

/// Every comment, grouped by exception.
pub async fn all(executor: impl SqliteExecutor<'_>) -> Result<Vec<Comment>, StoreError> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT id, exception_id, author, text, created_at FROM comments \
         ORDER BY exception_id, created_at, id",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(CommentRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    exception_id: i64,
    author: String,
    text: String,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_record(self) -> Comment {
        Comment {
            id: CommentId(self.id),
            exception_id: ExceptionId(self.exception_id),
            author: self.author,
            text: self.text,
            created_at: self.created_at,
        }
    }
}
