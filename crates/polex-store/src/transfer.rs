//! # Bulk Transfer
//!
//! Export every exception, soft-deleted ones included, together with its
//! ledger, comments and form files, and import the same document back.
//!
//! Import runs in one transaction. Exceptions are upserted by ID; ledger
//! entries, comments and files are inserted by ID and skipped when that ID
//! is already present under the same exception, so existing history is
//! never rewritten. An ID already owned by a different exception aborts the
//! import. Form file names must be bare names. The cached
//! status of each imported exception is recomputed from its ledger after
//! the children are in place. Any bad record aborts the whole import.
//!
//! Dates and statuses are kept as strings in the document types and parsed
//! inside the transaction, so a malformed record rolls back everything
//! written before it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use polex_core::{
    parse_optional_date, ExceptionId, FormFileId, StatusChangeId, ValidationError,
};
use polex_state::{
    current_status, Comment, Exception, ExceptionStatus, FormFile, StatusChange,
    MAX_FORM_FILE_BYTES,
};

use crate::annotations::validate_file_name;
use crate::db::{comments, exceptions, form_files, status_changes};
use crate::error::StoreError;

/// One exception and everything attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionDocument {
    pub id: ExceptionId,
    pub username: String,
    #[serde(default)]
    pub submitted_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub service: String,
    pub exception_type: String,
    pub detail: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status_changes: Vec<StatusChangeDocument>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub form_files: Vec<FormFileDocument>,
}

/// A ledger entry as carried in a transfer document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeDocument {
    pub id: StatusChangeId,
    pub exception_id: ExceptionId,
    pub old_status: String,
    pub new_status: String,
    pub changer: String,
    pub created_at: DateTime<Utc>,
}

/// A form file with base64-encoded contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFileDocument {
    pub id: FormFileId,
    pub exception_id: ExceptionId,
    pub file_name: String,
    #[serde(with = "base64_bytes")]
    pub contents: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Counts of rows written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Exceptions inserted or updated.
    pub exceptions: usize,
    /// Ledger entries inserted.
    pub status_changes: usize,
    /// Comments inserted.
    pub comments: usize,
    /// Form files inserted.
    pub form_files: usize,
    /// Child rows skipped because their ID already existed.
    pub skipped: usize,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Snapshot the whole store, ordered by exception ID.
pub async fn export(pool: &SqlitePool) -> Result<Vec<ExceptionDocument>, StoreError> {
    let mut ledger = group_by_exception(status_changes::all(pool).await?, |c| c.exception_id);
    let mut notes = group_by_exception(comments::all(pool).await?, |c| c.exception_id);
    let mut files = group_by_exception(form_files::all(pool).await?, |f| f.exception_id);

    let documents: Vec<ExceptionDocument> = exceptions::all_including_deleted(pool)
        .await?
        .into_iter()
        .map(|e| {
            let id = e.id;
            ExceptionDocument {
                id,
                username: e.username,
                submitted_date: e.submitted_date.map(|d| d.to_string()),
                start_date: e.start_date.map(|d| d.to_string()),
                end_date: e.end_date.map(|d| d.to_string()),
                service: e.service,
                exception_type: e.exception_type,
                detail: e.detail,
                status: e.status.as_str().to_owned(),
                created_at: e.created_at,
                updated_at: e.updated_at,
                deleted_at: e.deleted_at,
                status_changes: ledger
                    .remove(&id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|c| StatusChangeDocument {
                        id: c.id,
                        exception_id: c.exception_id,
                        old_status: c.old_status.as_str().to_owned(),
                        new_status: c.new_status.as_str().to_owned(),
                        changer: c.changer,
                        created_at: c.created_at,
                    })
                    .collect(),
                comments: notes.remove(&id).unwrap_or_default(),
                form_files: files
                    .remove(&id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|f| FormFileDocument {
                        id: f.id,
                        exception_id: f.exception_id,
                        file_name: f.file_name,
                        contents: f.contents,
                        created_at: f.created_at,
                    })
                    .collect(),
            }
        })
        .collect();

    tracing::info!(count = documents.len(), "exported exceptions");
    Ok(documents)
}

fn group_by_exception<T>(
    rows: Vec<T>,
    key: impl Fn(&T) -> ExceptionId,
) -> BTreeMap<ExceptionId, Vec<T>> {
    let mut grouped: BTreeMap<ExceptionId, Vec<T>> = BTreeMap::new();
    for row in rows {
        grouped.entry(key(&row)).or_default().push(row);
    }
    grouped
}

/// Serialize a snapshot as pretty JSON.
pub fn to_json(documents: &[ExceptionDocument]) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(documents)?)
}

/// Parse a snapshot previously written by [`to_json`].
pub fn from_json(text: &str) -> Result<Vec<ExceptionDocument>, StoreError> {
    Ok(serde_json::from_str(text)?)
}

/// Replay a snapshot into the store in a single transaction.
pub async fn import(
    pool: &SqlitePool,
    documents: &[ExceptionDocument],
) -> Result<ImportSummary, StoreError> {
    let mut tx = pool.begin().await?;
    let mut summary = ImportSummary::default();

    for document in documents {
        import_one(&mut *tx, document, &mut summary)
            .await
            .inspect_err(|e| {
                tracing::error!(exception_id = %document.id, error = %e, "import aborted");
            })?;
    }

    tx.commit().await?;
    tracing::info!(
        exceptions = summary.exceptions,
        status_changes = summary.status_changes,
        comments = summary.comments,
        form_files = summary.form_files,
        skipped = summary.skipped,
        "import committed"
    );
    Ok(summary)
}

async fn import_one(
    conn: &mut SqliteConnection,
    document: &ExceptionDocument,
    summary: &mut ImportSummary,
) -> Result<(), StoreError> {
    let exception = exception_from_document(document)?;
    exceptions::upsert(&mut *conn, &exception).await?;
    summary.exceptions += 1;

    for change in &document.status_changes {
        let change = status_change_from_document(document.id, change)?;
        if status_changes::insert_preserving_id(&mut *conn, &change).await? {
            summary.status_changes += 1;
        } else {
            let existing = status_changes::owner(&mut *conn, change.id).await?;
            check_existing(document.id, existing, "status change", change.id.get())?;
            summary.skipped += 1;
        }
    }

    for comment in &document.comments {
        check_owner(document.id, comment.exception_id, "comment")?;
        if comments::insert_preserving_id(&mut *conn, comment).await? {
            summary.comments += 1;
        } else {
            let existing = comments::owner(&mut *conn, comment.id).await?;
            check_existing(document.id, existing, "comment", comment.id.get())?;
            summary.skipped += 1;
        }
    }

    for file in &document.form_files {
        check_owner(document.id, file.exception_id, "form file")?;
        validate_file_name(&file.file_name)?;
        if file.contents.len() > MAX_FORM_FILE_BYTES {
            return Err(ValidationError::field(
                "form file",
                format!("{} exceeds the {MAX_FORM_FILE_BYTES} byte limit", file.file_name),
            )
            .into());
        }
        let file = FormFile {
            id: file.id,
            exception_id: file.exception_id,
            file_name: file.file_name.clone(),
            contents: file.contents.clone(),
            created_at: file.created_at,
        };
        if form_files::insert_preserving_id(&mut *conn, &file).await? {
            summary.form_files += 1;
        } else {
            let existing = form_files::owner(&mut *conn, file.id).await?;
            check_existing(document.id, existing, "form file", file.id.get())?;
            summary.skipped += 1;
        }
    }

    let ledger = current_status(&status_changes::for_exception(&mut *conn, document.id).await?);
    if ledger != exception.status {
        tracing::warn!(
            exception_id = %document.id,
            document = %exception.status,
            ledger = %ledger,
            "document status disagrees with ledger; using ledger"
        );
    }
    exceptions::restore_status(&mut *conn, document.id, ledger).await?;
    Ok(())
}

fn check_owner(
    expected: ExceptionId,
    found: ExceptionId,
    entity: &str,
) -> Result<(), ValidationError> {
    if expected == found {
        Ok(())
    } else {
        Err(ValidationError::field(
            entity,
            format!("listed under exception {expected} but belongs to {found}"),
        ))
    }
}

/// A child skipped on import must already belong to the same exception;
/// otherwise the document's history would silently lose an entry.
fn check_existing(
    expected: ExceptionId,
    existing: Option<ExceptionId>,
    entity: &str,
    id: i64,
) -> Result<(), ValidationError> {
    match existing {
        Some(owner) if owner != expected => Err(ValidationError::field(
            entity,
            format!("{entity} {id} for exception {expected} already belongs to exception {owner}"),
        )),
        _ => Ok(()),
    }
}

fn exception_from_document(document: &ExceptionDocument) -> Result<Exception, ValidationError> {
    Ok(Exception {
        id: document.id,
        username: document.username.clone(),
        submitted_date: parse_optional_date("submitted", document.submitted_date.as_deref())?,
        start_date: parse_optional_date("start", document.start_date.as_deref())?,
        end_date: parse_optional_date("end", document.end_date.as_deref())?,
        service: document.service.clone(),
        exception_type: document.exception_type.clone(),
        detail: document.detail.clone(),
        status: document.status.parse()?,
        created_at: document.created_at,
        updated_at: document.updated_at,
        deleted_at: document.deleted_at,
    })
}

fn status_change_from_document(
    owner: ExceptionId,
    change: &StatusChangeDocument,
) -> Result<StatusChange, ValidationError> {
    check_owner(owner, change.exception_id, "status change")?;
    Ok(StatusChange {
        id: change.id,
        exception_id: change.exception_id,
        old_status: change.old_status.parse::<ExceptionStatus>()?,
        new_status: change.new_status.parse::<ExceptionStatus>()?,
        changer: change.changer.clone(),
        created_at: change.created_at,
    })
}
