//! # polex-store: Exception Persistence
//!
//! SQLite storage for policy exceptions, built on SQLx.
//!
//! ## Modules
//!
//! - **Database** (`db/`): connection, migrations and row-level queries.
//! - **Lifecycle** (`lifecycle.rs`): submission and every status change.
//!   Each change appends to the ledger and updates the cached status in
//!   one transaction.
//! - **Annotations** (`annotations.rs`): comments and form attachments.
//! - **Classify** (`classify.rs`): list classes and the weekly report.
//! - **Transfer** (`transfer.rs`): JSON export and transactional import.
//! - **Sample** (`sample.rs`): demonstration data.
//!
//! Every read ignores soft-deleted exceptions except the export, which
//! carries them so a dump can be restored in full.

pub mod annotations;
pub mod classify;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod sample;
pub mod transfer;

pub use classify::ExceptionSummary;
pub use error::StoreError;
pub use transfer::{ExceptionDocument, FormFileDocument, ImportSummary, StatusChangeDocument};

pub use sqlx::SqlitePool;
