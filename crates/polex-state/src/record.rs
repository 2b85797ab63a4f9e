//! # Domain Records
//!
//! The exception is the aggregate root. Status changes, comments and form
//! files each point back at exactly one exception and are append-only once
//! written; they are never shared between exceptions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use polex_core::{
    parse_date, CommentId, ExceptionId, FormFileId, IntakePolicy, StatusChangeId, ValidationError,
};

use crate::status::ExceptionStatus;

/// Largest attachment the store accepts (16 MiB).
pub const MAX_FORM_FILE_BYTES: usize = 16 * 1024 * 1024;

/// A tracked policy exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    /// Row identifier.
    pub id: ExceptionId,
    /// User the exception applies to.
    pub username: String,
    /// Date the request reached the team.
    pub submitted_date: Option<NaiveDate>,
    /// First day the exception is in force.
    pub start_date: Option<NaiveDate>,
    /// Last day the exception is in force.
    pub end_date: Option<NaiveDate>,
    /// Service the exception applies to.
    pub service: String,
    /// Kind of exception (quota, queue, ...).
    pub exception_type: String,
    /// Free-text detail, e.g. the quota size.
    pub detail: String,
    /// Cached copy of the newest ledger entry's `new_status`.
    pub status: ExceptionStatus,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// One ledger entry: a single status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Row identifier.
    pub id: StatusChangeId,
    /// Owning exception.
    pub exception_id: ExceptionId,
    /// Status before the change.
    pub old_status: ExceptionStatus,
    /// Status after the change.
    pub new_status: ExceptionStatus,
    /// Account that made the change.
    pub changer: String,
    /// When the change was recorded.
    pub created_at: DateTime<Utc>,
}

/// A free-text comment on an exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Row identifier.
    pub id: CommentId,
    /// Owning exception.
    pub exception_id: ExceptionId,
    /// Account that wrote the comment.
    pub author: String,
    /// Comment body.
    pub text: String,
    /// When the comment was added.
    pub created_at: DateTime<Utc>,
}

/// An attached form, including its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    /// Row identifier.
    pub id: FormFileId,
    /// Owning exception.
    pub exception_id: ExceptionId,
    /// Base name of the uploaded file.
    pub file_name: String,
    /// Raw file contents.
    pub contents: Vec<u8>,
    /// When the file was attached.
    pub created_at: DateTime<Utc>,
}

/// Attachment metadata without the contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFileInfo {
    /// Row identifier.
    pub id: FormFileId,
    /// Owning exception.
    pub exception_id: ExceptionId,
    /// Base name of the uploaded file.
    pub file_name: String,
    /// Size of the contents in bytes.
    pub size: i64,
    /// When the file was attached.
    pub created_at: DateTime<Utc>,
}

/// An exception together with everything that hangs off it.
#[derive(Debug, Clone)]
pub struct ExceptionDetails {
    /// The exception itself.
    pub exception: Exception,
    /// Ledger entries, oldest first.
    pub status_changes: Vec<StatusChange>,
    /// Attachment metadata, oldest first.
    pub files: Vec<FormFileInfo>,
    /// Comments, oldest first.
    pub comments: Vec<Comment>,
}

/// Raw submission fields as typed by an operator.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Username the exception applies to.
    pub username: String,
    /// Submitted date, `YYYY-MM-DD`.
    pub submitted: String,
    /// Start date, `YYYY-MM-DD`.
    pub starts: String,
    /// End date, `YYYY-MM-DD`.
    pub ends: String,
    /// Service name.
    pub service: String,
    /// Exception type.
    pub exception_type: String,
    /// Free-text detail.
    pub detail: String,
}

/// A validated exception ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewException {
    /// Normalised username.
    pub username: String,
    /// Submitted date.
    pub submitted_date: NaiveDate,
    /// Start date.
    pub start_date: NaiveDate,
    /// End date.
    pub end_date: NaiveDate,
    /// Normalised service.
    pub service: String,
    /// Normalised exception type.
    pub exception_type: String,
    /// Free-text detail.
    pub detail: String,
}

impl Submission {
    /// Parse dates and run every intake filter.
    ///
    /// Fails on the first invalid field.
    pub fn validate(&self, policy: &IntakePolicy) -> Result<NewException, ValidationError> {
        Ok(NewException {
            submitted_date: parse_date("submitted", &self.submitted)?,
            start_date: parse_date("start", &self.starts)?,
            end_date: parse_date("end", &self.ends)?,
            username: policy.filter_username(&self.username)?,
            service: policy.filter_service(&self.service)?,
            exception_type: policy.filter_exception_type(&self.exception_type)?,
            detail: self.detail.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> Submission {
        Submission {
            username: "UCCAIKI".into(),
            submitted: "2026-01-10".into(),
            starts: "2026-01-15".into(),
            ends: "2027-01-15".into(),
            service: "Legion".into(),
            exception_type: "quota".into(),
            detail: "scratch:1TB".into(),
        }
    }

    #[test]
    fn valid_submission_is_normalised() {
        let new = submission().validate(&IntakePolicy::default()).unwrap();
        assert_eq!(new.username, "uccaiki");
        assert_eq!(new.service, "legion");
        assert_eq!(new.start_date, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert_eq!(new.detail, "scratch:1TB");
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut sub = submission();
        sub.ends = "next year".into();
        let err = sub.validate(&IntakePolicy::default()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDate { ref field, .. } if field == "end"));
    }

    #[test]
    fn unknown_service_is_rejected() {
        let mut sub = submission();
        sub.service = "deep-thought".into();
        assert!(matches!(
            sub.validate(&IntakePolicy::default()),
            Err(ValidationError::Service { .. })
        ));
    }

    #[test]
    fn form_file_limit_is_sixteen_mebibytes() {
        assert_eq!(MAX_FORM_FILE_BYTES, 16_777_216);
    }
}
