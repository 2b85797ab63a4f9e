//! # Validation Errors
//!
//! Input that cannot be accepted is rejected with a [`ValidationError`]
//! naming the offending field and, where it helps, the accepted values.

use thiserror::Error;

/// Rejected user or document input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A date field did not parse as `YYYY-MM-DD`.
    #[error("could not parse {field} date {value:?}: expected YYYY-MM-DD")]
    InvalidDate {
        /// Which date field (e.g. "start").
        field: String,
        /// The text that was supplied.
        value: String,
    },

    /// The username broke one or more rules; all problems are listed.
    #[error("invalid username: {}", problems.join("; "))]
    Username {
        /// Each rule the username broke.
        problems: Vec<String>,
    },

    /// The service is not in the allowed list.
    #[error("invalid service {given:?}, must be one of: {}", allowed.join(", "))]
    Service {
        /// The service that was supplied.
        given: String,
        /// The configured services.
        allowed: Vec<String>,
    },

    /// The exception type is not in the allowed list.
    #[error("invalid exception type {given:?}, must be one of: {}", allowed.join(", "))]
    ExceptionType {
        /// The type that was supplied.
        given: String,
        /// The configured exception types.
        allowed: Vec<String>,
    },

    /// A status name that is not part of the lifecycle.
    #[error("unknown status {0:?}")]
    UnknownStatus(String),

    /// Any other malformed field.
    #[error("invalid {field}: {reason}")]
    Field {
        /// Field name.
        field: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Field`].
    pub fn field(field: &str, reason: impl Into<String>) -> Self {
        Self::Field {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
