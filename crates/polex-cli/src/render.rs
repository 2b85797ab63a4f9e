//! Plain-text rendering of lists, file tables and exception details.

use chrono::NaiveDate;

use polex_core::{format_date, Remaining};
use polex_state::{ExceptionDetails, FormFileInfo};
use polex_store::ExceptionSummary;

/// Borderless table with left-aligned, space-padded columns.
#[derive(Debug, Default)]
pub struct Table {
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn with_header<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: Some(header.into_iter().map(Into::into).collect()),
            rows: Vec::new(),
        }
    }

    pub fn push<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn render(&self) -> String {
        let all_rows = self.header.iter().chain(self.rows.iter());
        let columns = all_rows.clone().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in all_rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let mut line = |row: &[String]| {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
                .collect();
            out.push_str(cells.join("  ").trim_end());
            out.push('\n');
        };
        if let Some(header) = &self.header {
            line(header);
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            line(&rule);
        }
        for row in &self.rows {
            line(row);
        }
        out
    }
}

/// The `list` table.
pub fn summary_table(rows: &[ExceptionSummary]) -> String {
    if rows.is_empty() {
        return "No such records found.\n".to_owned();
    }
    let mut table = Table::with_header([
        "ID",
        "Username",
        "Status",
        "Sub Date",
        "Start Date",
        "End Date",
        "Service",
        "Type",
        "Detail",
        "Attachments",
        "Comments",
    ]);
    for row in rows {
        table.push([
            row.id.to_string(),
            row.username.clone(),
            row.status.to_string(),
            format_date(row.submitted_date),
            format_date(row.start_date),
            format_date(row.end_date),
            row.service.clone(),
            row.exception_type.clone(),
            row.detail.clone(),
            row.file_count.to_string(),
            row.comment_count.to_string(),
        ]);
    }
    table.render()
}

/// The `form list` table.
pub fn file_table(files: &[FormFileInfo]) -> String {
    let mut table = Table::with_header(["ID", "Exception", "Created On", "Filename", "Size"]);
    for file in files {
        table.push([
            file.id.to_string(),
            file.exception_id.to_string(),
            file.created_at.date_naive().to_string(),
            file.file_name.clone(),
            file.size.to_string(),
        ]);
    }
    table.render()
}

/// The `details` view: one labelled row per field, then the ledger,
/// attachments and comments.
pub fn details(view: &ExceptionDetails, today: NaiveDate) -> String {
    let e = &view.exception;
    let timestamp = "%Y-%m-%d %H:%M:%S UTC";

    let mut table = Table::default();
    table.push(["ID".to_owned(), e.id.to_string()]);
    table.push(["Username".to_owned(), e.username.clone()]);
    table.push(["Service".to_owned(), e.service.clone()]);
    table.push(["Type".to_owned(), e.exception_type.clone()]);
    table.push(["Detail".to_owned(), e.detail.clone()]);
    table.push(["Created".to_owned(), e.created_at.format(timestamp).to_string()]);
    table.push(["Updated".to_owned(), e.updated_at.format(timestamp).to_string()]);
    table.push(["Submitted".to_owned(), format_date(e.submitted_date)]);
    table.push(["Starts".to_owned(), format_date(e.start_date)]);
    table.push(["Ends".to_owned(), format_date(e.end_date)]);
    table.push([
        "Remaining".to_owned(),
        Remaining::between(e.start_date, e.end_date, today).to_string(),
    ]);
    table.push(["Status".to_owned(), e.status.to_string()]);

    labelled(
        &mut table,
        "Status Change",
        view.status_changes.iter().map(|c| {
            format!(
                "{} -> {}, by {} [{}]",
                c.old_status,
                c.new_status,
                c.changer,
                c.created_at.date_naive()
            )
        }),
    );
    labelled(
        &mut table,
        "File",
        view
            .files
            .iter()
            .map(|f| format!("{} (#{}, {} bytes)", f.file_name, f.id, f.size)),
    );
    labelled(
        &mut table,
        "Comment",
        view.comments.iter().map(|c| {
            format!(
                "{} [{}, {}]",
                c.text.trim_end(),
                c.author,
                c.created_at.date_naive()
            )
        }),
    );
    table.render()
}

/// Rows sharing one label: the label on the first row only, `(none)` when
/// there are no rows.
fn labelled(table: &mut Table, label: &str, values: impl Iterator<Item = String>) {
    let mut first = true;
    for value in values {
        let shown = if first { label } else { "" };
        table.push([shown.to_owned(), value]);
        first = false;
    }
    if first {
        table.push([label.to_owned(), "(none)".to_owned()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use polex_core::{CommentId, ExceptionId, StatusChangeId};
    use polex_state::{Comment, Exception, ExceptionStatus, StatusChange};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn sample_details() -> ExceptionDetails {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        ExceptionDetails {
            exception: Exception {
                id: ExceptionId(7),
                username: "ccspapp".into(),
                submitted_date: Some(day(3, 1)),
                start_date: Some(day(3, 2)),
                end_date: None,
                service: "myriad".into(),
                exception_type: "quota".into(),
                detail: "5TB Scratch".into(),
                status: ExceptionStatus::Undecided,
                created_at: at,
                updated_at: at,
                deleted_at: None,
            },
            status_changes: vec![StatusChange {
                id: StatusChangeId(1),
                exception_id: ExceptionId(7),
                old_status: ExceptionStatus::Unrecorded,
                new_status: ExceptionStatus::Undecided,
                changer: "ccspadm".into(),
                created_at: at,
            }],
            files: Vec::new(),
            comments: vec![Comment {
                id: CommentId(1),
                exception_id: ExceptionId(7),
                author: "ccspadm".into(),
                text: "waiting on panel\n".into(),
                created_at: at,
            }],
        }
    }

    #[test]
    fn table_columns_align() {
        let mut table = Table::with_header(["ID", "Name"]);
        table.push(["1", "a"]);
        table.push(["10", "bb"]);
        assert_eq!(table.render(), "ID  Name\n--  ----\n1   a\n10  bb\n");
    }

    #[test]
    fn empty_list_says_so() {
        assert_eq!(summary_table(&[]), "No such records found.\n");
    }

    #[test]
    fn details_show_ledger_files_and_comments() {
        let text = details(&sample_details(), day(3, 5));
        let row = |label: &str| {
            text.lines()
                .find(|l| l.starts_with(label))
                .map(|l| l[label.len()..].trim().to_owned())
                .unwrap()
        };
        assert_eq!(row("Created"), "2026-03-01 09:30:00 UTC");
        assert_eq!(row("Ends"), "--");
        assert_eq!(row("Remaining"), "--");
        assert_eq!(row("File"), "(none)");
        assert_eq!(row("Status Change"), "(none) -> undecided, by ccspadm [2026-03-01]");
        assert_eq!(row("Comment"), "waiting on panel [ccspadm, 2026-03-01]");
    }
}
