//! # Store Errors
//!
//! Every fallible store operation returns [`StoreError`]. The caller-facing
//! kinds are `NotFound`, `InvalidTransition`, `Validation` and
//! `Persistence`; the remaining variants describe a damaged database or
//! document.

use thiserror::Error;

use polex_core::ValidationError;
use polex_state::TransitionError;

/// Errors raised by the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No live record of that kind has the given identifier.
    #[error("no record of {entity} {id}")]
    NotFound {
        /// Record kind ("exception", "form file", ...).
        entity: &'static str,
        /// The identifier that was looked up.
        id: i64,
    },

    /// The transition policy rejected an unforced status change.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// Input failed validation before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The database reported a failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A persisted row holds a value the application cannot interpret.
    #[error("corrupt {entity} {id}: {reason}")]
    Corrupt {
        /// Record kind.
        entity: &'static str,
        /// Row identifier.
        id: i64,
        /// What could not be interpreted.
        reason: String,
    },

    /// A transfer document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Whether the error concerns one request rather than the store as a
    /// whole, so a long-running caller can report it and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::InvalidTransition(_) | Self::Validation(_)
        )
    }
}
