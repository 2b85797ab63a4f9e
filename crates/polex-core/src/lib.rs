//! # polex-core: Foundational Types for Policy Exception Tracking
//!
//! Leaf crate of the workspace. Defines the primitives every other crate
//! builds on: typed record identifiers, calendar-date handling, and the
//! intake filters applied to submitted exceptions.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `ExceptionId`, `StatusChangeId`, `CommentId`
//!    and `FormFileId` are distinct types, so a file ID can never be passed
//!    where an exception ID is expected.
//!
//! 2. **Dates are calendar days.** Submitted, start and end dates are
//!    `chrono::NaiveDate` values exchanged as `YYYY-MM-DD`. A malformed date
//!    is a hard validation error, never a silent default.
//!
//! 3. **Intake is normalised once.** Usernames, services and exception types
//!    are lower-cased and checked against an [`IntakePolicy`] before they
//!    reach storage.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `polex-*` crates.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod intake;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{CommentId, ExceptionId, FormFileId, StatusChangeId};
pub use intake::IntakePolicy;
pub use temporal::{format_date, parse_date, parse_optional_date, Remaining};
