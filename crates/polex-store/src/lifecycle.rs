//! # Lifecycle Engine
//!
//! The only writer of exception status. Every transition appends one
//! ledger entry and overwrites the cached status inside a single
//! transaction, so the two can never be observed apart.
//!
//! `get_status` reads the cached column. `reconstruct_status` derives the
//! status from the ledger with [`polex_state::current_status`]; `verify`
//! compares the two and reports any record where they differ.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use polex_core::{ExceptionId, StatusChangeId};
use polex_state::{
    current_status, is_valid_transition, Divergence, ExceptionDetails, ExceptionStatus,
    NewException, TransitionError,
};

use crate::db::{comments, exceptions, form_files, status_changes};
use crate::error::StoreError;

/// Create an exception and move it to `undecided`.
///
/// The insert and the initial transition commit together.
pub async fn submit(
    pool: &SqlitePool,
    new: &NewException,
    actor: &str,
) -> Result<ExceptionId, StoreError> {
    let mut tx = pool.begin().await?;
    let id = exceptions::insert(&mut *tx, new, Utc::now()).await?;
    apply_transition(&mut *tx, id, ExceptionStatus::Undecided, actor, true).await?;
    tx.commit().await?;

    tracing::info!(exception_id = %id, username = %new.username, "exception submitted");
    Ok(id)
}

/// Move an exception to `proposed`.
///
/// Unless `force` is set, the transition must be allowed by the policy
/// table; a rejected transition writes nothing.
pub async fn change_status(
    pool: &SqlitePool,
    id: ExceptionId,
    proposed: ExceptionStatus,
    actor: &str,
    force: bool,
) -> Result<StatusChangeId, StoreError> {
    let mut tx = pool.begin().await?;
    let change_id = apply_transition(&mut *tx, id, proposed, actor, force).await?;
    tx.commit().await?;
    Ok(change_id)
}

/// Ledger append and cache update on an open connection. The caller owns
/// the transaction.
pub(crate) async fn apply_transition(
    conn: &mut SqliteConnection,
    id: ExceptionId,
    proposed: ExceptionStatus,
    actor: &str,
    force: bool,
) -> Result<StatusChangeId, StoreError> {
    let current = exceptions::require_live(&mut *conn, id).await?.status;

    if !force {
        TransitionError::check(current, proposed)?;
    } else if !is_valid_transition(current, proposed) {
        tracing::warn!(
            exception_id = %id,
            from = %current,
            to = %proposed,
            "forcing transition outside the policy table"
        );
    }

    let now = Utc::now();
    let change_id = status_changes::insert(&mut *conn, id, current, proposed, actor, now).await?;
    exceptions::set_status(&mut *conn, id, proposed, now).await?;

    tracing::info!(
        exception_id = %id,
        status_change_id = %change_id,
        from = %current,
        to = %proposed,
        actor,
        "status changed"
    );
    Ok(change_id)
}

/// Return an exception to `undecided`.
pub async fn undecide(
    pool: &SqlitePool,
    id: ExceptionId,
    actor: &str,
    force: bool,
) -> Result<StatusChangeId, StoreError> {
    change_status(pool, id, ExceptionStatus::Undecided, actor, force).await
}

/// Approve an undecided exception.
pub async fn approve(
    pool: &SqlitePool,
    id: ExceptionId,
    actor: &str,
    force: bool,
) -> Result<StatusChangeId, StoreError> {
    change_status(pool, id, ExceptionStatus::Approved, actor, force).await
}

/// Reject an undecided exception.
pub async fn reject(
    pool: &SqlitePool,
    id: ExceptionId,
    actor: &str,
    force: bool,
) -> Result<StatusChangeId, StoreError> {
    change_status(pool, id, ExceptionStatus::Rejected, actor, force).await
}

/// Mark an approved exception as implemented.
pub async fn implement(
    pool: &SqlitePool,
    id: ExceptionId,
    actor: &str,
    force: bool,
) -> Result<StatusChangeId, StoreError> {
    change_status(pool, id, ExceptionStatus::Implemented, actor, force).await
}

/// Mark an implemented exception as removed.
pub async fn remove(
    pool: &SqlitePool,
    id: ExceptionId,
    actor: &str,
    force: bool,
) -> Result<StatusChangeId, StoreError> {
    change_status(pool, id, ExceptionStatus::Removed, actor, force).await
}

/// Cached status of a live exception.
pub async fn get_status(pool: &SqlitePool, id: ExceptionId) -> Result<ExceptionStatus, StoreError> {
    Ok(exceptions::require_live(pool, id).await?.status)
}

/// Status of a live exception as derived from its ledger.
pub async fn reconstruct_status(
    pool: &SqlitePool,
    id: ExceptionId,
) -> Result<ExceptionStatus, StoreError> {
    if !exceptions::exists_live(pool, id).await? {
        return Err(StoreError::not_found("exception", id));
    }
    let changes = status_changes::for_exception(pool, id).await?;
    Ok(current_status(&changes))
}

/// Compare cached and reconstructed status for one live exception, or for
/// all of them when `id` is `None`.
pub async fn verify(
    pool: &SqlitePool,
    id: Option<ExceptionId>,
) -> Result<Vec<Divergence>, StoreError> {
    let targets = match id {
        Some(id) => vec![exceptions::require_live(pool, id).await?],
        None => exceptions::all_including_deleted(pool)
            .await?
            .into_iter()
            .filter(|e| e.deleted_at.is_none())
            .collect(),
    };

    let mut found = Vec::new();
    for exception in targets {
        let changes = status_changes::for_exception(pool, exception.id).await?;
        if let Some(divergence) =
            Divergence::detect(exception.id, exception.status, current_status(&changes))
        {
            tracing::warn!(%divergence, "cached status disagrees with ledger");
            found.push(divergence);
        }
    }
    Ok(found)
}

/// Soft-delete an exception. Its children stay in place but become
/// unreachable.
pub async fn delete(pool: &SqlitePool, id: ExceptionId, actor: &str) -> Result<(), StoreError> {
    exceptions::soft_delete(pool, id, Utc::now()).await?;
    tracing::info!(exception_id = %id, actor, "exception deleted");
    Ok(())
}

/// A live exception with its ledger, attachments and comments.
pub async fn details(pool: &SqlitePool, id: ExceptionId) -> Result<ExceptionDetails, StoreError> {
    let exception = exceptions::require_live(pool, id).await?;
    Ok(ExceptionDetails {
        status_changes: status_changes::for_exception(pool, id).await?,
        files: form_files::info_for_exception(pool, id).await?,
        comments: comments::for_exception(pool, id).await?,
        exception,
    })
}
