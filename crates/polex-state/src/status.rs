//! # Exception Status and Transition Policy
//!
//! The status names are persisted verbatim, so the string forms returned by
//! [`ExceptionStatus::as_str`] are part of the storage format.
//!
//! | current | allowed next |
//! |---|---|
//! | (none) | undecided |
//! | undecided | approved, rejected |
//! | approved | implemented |
//! | implemented | removed |
//! | rejected | (terminal) |
//! | removed | (terminal) |

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use polex_core::ValidationError;

/// Lifecycle status of a policy exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionStatus {
    /// No status change has been recorded yet.
    #[serde(rename = "(none)")]
    Unrecorded,
    /// Submitted and awaiting a decision.
    Undecided,
    /// Approved, awaiting implementation.
    Approved,
    /// Rejected (terminal).
    Rejected,
    /// Put in place on the service.
    Implemented,
    /// Taken back out of the service (terminal).
    Removed,
}

impl ExceptionStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [ExceptionStatus; 6] = [
        Self::Unrecorded,
        Self::Undecided,
        Self::Approved,
        Self::Rejected,
        Self::Implemented,
        Self::Removed,
    ];

    /// Canonical persisted name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unrecorded => "(none)",
            Self::Undecided => "undecided",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Implemented => "implemented",
            Self::Removed => "removed",
        }
    }

    /// Statuses reachable from this one without forcing.
    ///
    /// No wildcard arm, so a new variant has to be placed in the table.
    pub fn valid_transitions(&self) -> &'static [ExceptionStatus] {
        match self {
            Self::Unrecorded => &[Self::Undecided],
            Self::Undecided => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Implemented],
            Self::Implemented => &[Self::Removed],
            Self::Rejected => &[],
            Self::Removed => &[],
        }
    }

    /// Whether no further unforced transition is possible.
    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

impl std::fmt::Display for ExceptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExceptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// Whether `current -> proposed` appears in the transition table.
///
/// Never fails: any pair not listed is simply invalid.
pub fn is_valid_transition(current: ExceptionStatus, proposed: ExceptionStatus) -> bool {
    current.valid_transitions().contains(&proposed)
}

/// A proposed status change rejected by the transition policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("proposed status change ({from} -> {to}) is invalid")]
pub struct TransitionError {
    /// Status the exception is currently in.
    pub from: ExceptionStatus,
    /// Status that was requested.
    pub to: ExceptionStatus,
}

impl TransitionError {
    /// Check a transition, returning the error when the table forbids it.
    pub fn check(from: ExceptionStatus, to: ExceptionStatus) -> Result<(), TransitionError> {
        if is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(TransitionError { from, to })
        }
    }
}
