//! # Record Identifiers
//!
//! Newtype wrappers for the row identifiers of each record kind. Operators
//! type these on the command line, so they are small integers rather than
//! UUIDs, and they display as the bare number.

use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Access the raw row identifier.
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of an exception record (the aggregate root).
    ExceptionId
);

record_id!(
    /// Identifier of one entry in the status-change ledger.
    StatusChangeId
);

record_id!(
    /// Identifier of a comment on an exception.
    CommentId
);

record_id!(
    /// Identifier of an attached form file.
    FormFileId
);
