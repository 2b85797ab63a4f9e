//! # Report Classifier
//!
//! List classes and report categories are fixed predicates over the
//! persisted `status`, `submitted_date`, `start_date` and `end_date`
//! columns of live exceptions. Dates are stored as `YYYY-MM-DD` text, so
//! the comparisons below are plain string comparisons. An unset date never
//! satisfies a comparison.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;

use polex_core::ExceptionId;
use polex_state::{ExceptionStatus, ListClass, Report, ReportCategory, ReportWindow};

use crate::error::StoreError;

/// One row of `list` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionSummary {
    pub id: ExceptionId,
    pub username: String,
    pub submitted_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub service: String,
    pub exception_type: String,
    pub detail: String,
    pub status: ExceptionStatus,
    pub comment_count: i64,
    pub file_count: i64,
}

fn status_is(status: ExceptionStatus) -> String {
    format!("status = '{}'", status.as_str())
}

/// SQL predicate for a list class. `?1` is the reference day.
fn list_predicate(class: ListClass) -> String {
    use ExceptionStatus::*;

    let needed = format!("({} AND start_date > ?1)", status_is(Approved));
    let overdue = format!("({} AND end_date < ?1)", status_is(Implemented));
    match class {
        ListClass::All => "1 = 1".to_owned(),
        ListClass::Undecided => status_is(Undecided),
        ListClass::Approved => status_is(Approved),
        ListClass::Rejected => status_is(Rejected),
        ListClass::Removed => status_is(Removed),
        ListClass::Active => status_is(Implemented),
        ListClass::Needed => needed,
        ListClass::Overdue => overdue,
        ListClass::Pending => format!(
            "(status IN ('{}', '{}') AND start_date > ?1)",
            Approved.as_str(),
            Implemented.as_str()
        ),
        ListClass::Todo => format!("({overdue} OR {needed} OR {})", status_is(Undecided)),
        ListClass::Inconsistent => "(submitted_date IS NULL \
             OR (start_date IS NULL AND end_date IS NOT NULL) \
             OR start_date > end_date)"
            .to_owned(),
    }
}

/// SQL predicate for a report category and the number of window edges it
/// reads. `?1` is today, `?2` is today+5 and `?3` is today+14.
fn report_predicate(category: ReportCategory) -> (String, usize) {
    use ExceptionStatus::*;

    match category {
        ReportCategory::DecisionWaiting => (status_is(Undecided), 0),
        ReportCategory::ImplementationWaiting => {
            (format!("{} AND start_date > ?1", status_is(Approved)), 1)
        }
        ReportCategory::RemovalWaiting => {
            (format!("{} AND end_date < ?1", status_is(Implemented)), 1)
        }
        ReportCategory::ExpiresWithinFiveDays => (
            format!(
                "{} AND end_date >= ?1 AND end_date < ?2",
                status_is(Implemented)
            ),
            2,
        ),
        ReportCategory::ExpiresWithinTwoWeeks => (
            format!(
                "{} AND end_date >= ?2 AND end_date < ?3",
                status_is(Implemented)
            ),
            3,
        ),
    }
}

/// Live exceptions in a list class, optionally restricted to one service,
/// ordered by ID.
pub async fn list(
    pool: &SqlitePool,
    class: ListClass,
    service: Option<&str>,
    today: NaiveDate,
) -> Result<Vec<ExceptionSummary>, StoreError> {
    let sql = format!(
        "SELECT e.id, e.username, e.submitted_date, e.start_date, e.end_date, e.service, \
         e.exception_type, e.detail, e.status, \
         (SELECT COUNT(*) FROM comments c WHERE c.exception_id = e.id) AS comment_count, \
         (SELECT COUNT(*) FROM form_files f WHERE f.exception_id = e.id) AS file_count \
         FROM exceptions e \
         WHERE e.deleted_at IS NULL AND {} AND (?2 IS NULL OR e.service = ?2) \
         ORDER BY e.id",
        list_predicate(class)
    );

    let rows = sqlx::query_as::<_, SummaryRow>(&sql)
        .bind(today)
        .bind(service)
        .fetch_all(pool)
        .await?;

    tracing::debug!(%class, count = rows.len(), "listed exceptions");
    rows.into_iter().map(SummaryRow::into_summary).collect()
}

/// Bucket live exceptions into the report categories for `today`.
pub async fn report(pool: &SqlitePool, today: NaiveDate) -> Result<Report, StoreError> {
    let window = ReportWindow::new(today);
    let mut report = Report::empty(window);

    let edges = [window.today, window.five_days, window.two_weeks];

    for category in ReportCategory::ALL {
        let (predicate, arity) = report_predicate(category);
        let sql = format!(
            "SELECT id FROM exceptions WHERE deleted_at IS NULL AND {predicate} ORDER BY id"
        );
        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        for edge in &edges[..arity] {
            query = query.bind(*edge);
        }
        let ids = query.fetch_all(pool).await?;
        report
            .entries
            .insert(category, ids.into_iter().map(|(id,)| ExceptionId(id)).collect());
    }

    tracing::debug!(%today, "report classified");
    Ok(report)
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    username: String,
    submitted_date: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    service: String,
    exception_type: String,
    detail: String,
    status: String,
    comment_count: i64,
    file_count: i64,
}

impl SummaryRow {
    fn into_summary(self) -> Result<ExceptionSummary, StoreError> {
        let status = self.status.parse().map_err(|_| StoreError::Corrupt {
            entity: "exception",
            id: self.id,
            reason: format!("unknown status {:?}", self.status),
        })?;
        Ok(ExceptionSummary {
            id: ExceptionId(self.id),
            username: self.username,
            submitted_date: self.submitted_date,
            start_date: self.start_date,
            end_date: self.end_date,
            service: self.service,
            exception_type: self.exception_type,
            detail: self.detail,
            status,
            comment_count: self.comment_count,
            file_count: self.file_count,
        })
    }
}
