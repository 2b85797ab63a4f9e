//! # polex-state: Exception Lifecycle
//!
//! The storage-independent half of policy exception tracking.
//!
//! ## Lifecycle
//!
//! ```text
//! (none) ──▶ undecided ──▶ approved ──▶ implemented ──▶ removed (terminal)
//!                │
//!                └──▶ rejected (terminal)
//! ```
//!
//! - **Status** (`status.rs`): the status enum and the fixed transition
//!   table. Pure and deterministic.
//! - **Records** (`record.rs`): the exception aggregate and its append-only
//!   children (status changes, comments, form files).
//! - **Ledger** (`ledger.rs`): the projection that derives the current
//!   status from the status-change log, and the check that compares it with
//!   an exception's cached status.
//! - **Report** (`report.rs`): report categories, list classes and the
//!   date windows they are evaluated against.
//!
//! ## Design
//!
//! The ledger is the definition of truth; the cached status on an
//! exception exists so that listing does not aggregate over the ledger.
//! Nothing in this crate writes either one. The single writer lives in
//! `polex-store`, which updates both inside one transaction.

pub mod ledger;
pub mod record;
pub mod report;
pub mod status;

pub use ledger::{current_status, Divergence};
pub use record::{
    Comment, Exception, ExceptionDetails, FormFile, FormFileInfo, NewException, StatusChange,
    Submission, MAX_FORM_FILE_BYTES,
};
pub use report::{ListClass, Report, ReportCategory, ReportWindow};
pub use status::{is_valid_transition, ExceptionStatus, TransitionError};
