//! # Status Ledger Projection
//!
//! The ledger of [`StatusChange`] rows is the canonical record of an
//! exception's status: the active status is the `new_status` of the
//! chronologically last entry, or `(none)` when there are no entries.
//! Entries created in the same instant are ordered by row identifier.
//!
//! The cached status on [`Exception`](crate::Exception) must always equal
//! this projection. A [`Divergence`] describes a record where it does not.

use serde::Serialize;

use polex_core::ExceptionId;

use crate::record::StatusChange;
use crate::status::ExceptionStatus;

/// Derive the current status from an exception's ledger entries.
///
/// Input order does not matter.
pub fn current_status(changes: &[StatusChange]) -> ExceptionStatus {
    changes
        .iter()
        .max_by_key(|c| (c.created_at, c.id))
        .map(|c| c.new_status)
        .unwrap_or(ExceptionStatus::Unrecorded)
}

/// An exception whose cached status disagrees with its ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Divergence {
    /// The affected exception.
    pub exception_id: ExceptionId,
    /// Status held in the exception row.
    pub cached: ExceptionStatus,
    /// Status reconstructed from the ledger.
    pub ledger: ExceptionStatus,
}

impl Divergence {
    /// Compare a cached status with the ledger projection.
    pub fn detect(
        exception_id: ExceptionId,
        cached: ExceptionStatus,
        ledger: ExceptionStatus,
    ) -> Option<Divergence> {
        (cached != ledger).then_some(Divergence {
            exception_id,
            cached,
            ledger,
        })
    }
}

impl std::fmt::Display for Divergence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "exception {}: cached status {} but ledger says {}",
            self.exception_id, self.cached, self.ledger
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use polex_core::StatusChangeId;
    use ExceptionStatus::*;

    fn change(id: i64, secs: i64, old: ExceptionStatus, new: ExceptionStatus) -> StatusChange {
        StatusChange {
            id: StatusChangeId(id),
            exception_id: ExceptionId(1),
            old_status: old,
            new_status: new,
            changer: "ccspapp".into(),
            created_at: Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap(),
        }
    }

    #[test]
    fn empty_ledger_is_unrecorded() {
        assert_eq!(current_status(&[]), Unrecorded);
    }

    #[test]
    fn newest_entry_wins_regardless_of_order() {
        let changes = vec![
            change(3, 30, Approved, Implemented),
            change(1, 10, Unrecorded, Undecided),
            change(2, 20, Undecided, Approved),
        ];
        assert_eq!(current_status(&changes), Implemented);
    }

    #[test]
    fn same_instant_is_broken_by_row_id() {
        let changes = vec![
            change(5, 10, Undecided, Rejected),
            change(4, 10, Unrecorded, Undecided),
        ];
        assert_eq!(current_status(&changes), Rejected);
    }

    #[test]
    fn projection_is_stable_across_calls() {
        let changes = vec![change(1, 0, Unrecorded, Undecided), change(2, 5, Undecided, Approved)];
        assert_eq!(current_status(&changes), current_status(&changes));
    }

    #[test]
    fn divergence_detection() {
        assert!(Divergence::detect(ExceptionId(9), Approved, Approved).is_none());
        let d = Divergence::detect(ExceptionId(9), Approved, Undecided).unwrap();
        assert_eq!(
            d.to_string(),
            "exception 9: cached status approved but ledger says undecided"
        );
    }
}
