//! Comments and form attachments.
//!
//! Both are append-only children of a live exception.

use chrono::Utc;
use sqlx::SqlitePool;

use polex_core::{CommentId, ExceptionId, FormFileId, ValidationError};
use polex_state::{FormFile, FormFileInfo, MAX_FORM_FILE_BYTES};

use crate::db::{comments, exceptions, form_files};
use crate::error::StoreError;

/// Add a comment to a live exception.
pub async fn add_comment(
    pool: &SqlitePool,
    id: ExceptionId,
    author: &str,
    text: &str,
) -> Result<CommentId, StoreError> {
    let text = text.trim_end();
    if text.trim().is_empty() {
        return Err(ValidationError::field("comment", "text is empty").into());
    }

    let mut tx = pool.begin().await?;
    if !exceptions::exists_live(&mut *tx, id).await? {
        return Err(StoreError::not_found("exception", id));
    }
    let comment_id = comments::insert(&mut *tx, id, author, text, Utc::now()).await?;
    tx.commit().await?;

    tracing::info!(exception_id = %id, comment_id = %comment_id, author, "comment added");
    Ok(comment_id)
}

/// Attach a file to a live exception.
///
/// `file_name` must already be a bare file name.
pub async fn attach(
    pool: &SqlitePool,
    id: ExceptionId,
    file_name: &str,
    contents: &[u8],
) -> Result<FormFileId, StoreError> {
    validate_file_name(file_name)?;
    if contents.len() > MAX_FORM_FILE_BYTES {
        return Err(ValidationError::field(
            "form file",
            format!(
                "{} bytes exceeds the {MAX_FORM_FILE_BYTES} byte limit",
                contents.len()
            ),
        )
        .into());
    }

    let mut tx = pool.begin().await?;
    if !exceptions::exists_live(&mut *tx, id).await? {
        return Err(StoreError::not_found("exception", id));
    }
    let file_id = form_files::insert(&mut *tx, id, file_name, contents, Utc::now()).await?;
    tx.commit().await?;

    tracing::info!(
        exception_id = %id,
        form_file_id = %file_id,
        file_name,
        size = contents.len(),
        "form attached"
    );
    Ok(file_id)
}

/// A stored file name must be a bare name that cannot leave a directory.
pub(crate) fn validate_file_name(file_name: &str) -> Result<(), ValidationError> {
    if file_name.is_empty() || file_name == "." || file_name == ".." {
        return Err(ValidationError::field("file name", "must not be empty"));
    }
    if file_name.contains(['/', '\\', '\0']) {
        return Err(ValidationError::field(
            "file name",
            format!("{file_name:?} is not a bare file name"),
        ));
    }
    Ok(())
}

/// Attachment metadata for every live exception.
pub async fn list_files(pool: &SqlitePool) -> Result<Vec<FormFileInfo>, StoreError> {
    form_files::info_all_live(pool).await
}

/// Attachment metadata for one live exception.
pub async fn files_for_exception(
    pool: &SqlitePool,
    id: ExceptionId,
) -> Result<Vec<FormFileInfo>, StoreError> {
    if !exceptions::exists_live(pool, id).await? {
        return Err(StoreError::not_found("exception", id));
    }
    form_files::info_for_exception(pool, id).await
}

/// One attachment including its contents.
pub async fn get_file(pool: &SqlitePool, id: FormFileId) -> Result<FormFile, StoreError> {
    form_files::get(pool, id)
        .await?
        .ok_or_else(|| StoreError::not_found("form file", id))
}
