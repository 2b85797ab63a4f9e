//! # Calendar Dates
//!
//! Exception dates (submitted, start, end) are whole calendar days. They
//! cross every external boundary (command line, JSON documents) as
//! `YYYY-MM-DD` strings and are stored the same way, so lexical and
//! chronological ordering agree inside the database.

use chrono::{Datelike, NaiveDate};

use crate::error::ValidationError;

/// The only accepted textual date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Placeholder rendered for an unset date.
pub const UNSET: &str = "--";

/// Years that format as exactly four digits. Outside this range the text
/// form gains a sign or a fifth digit and no longer sorts chronologically.
const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// The latest date that can be stored, 9999-12-31.
pub fn last_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(*YEARS.end(), 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDate`] naming `field` when the text is
/// not a valid calendar date in that exact format, including a year outside
/// 0001..=9999.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    };
    let date = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| invalid())?;
    if !YEARS.contains(&date.year()) {
        return Err(invalid());
    }
    Ok(date)
}

/// Parse an optional date; `None` and the empty string both mean unset.
pub fn parse_optional_date(
    field: &str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, ValidationError> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_date(field, s).map(Some),
    }
}

/// Render an optional date, using `--` when it is unset.
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format(DATE_FORMAT).to_string(),
        None => UNSET.to_string(),
    }
}

/// How much of an exception's validity window is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    /// Start or end date is unset.
    Unknown,
    /// The end date has passed.
    Finished,
    /// The start date is still in the future.
    NotStarted,
    /// Whole days left until the end date.
    Days(i64),
}

impl Remaining {
    /// Compute the remaining window relative to `today`.
    pub fn between(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        let (Some(start), Some(end)) = (start, end) else {
            return Self::Unknown;
        };
        if today > end {
            return Self::Finished;
        }
        if today < start {
            return Self::NotStarted;
        }
        Self::Days((end - today).num_days())
    }
}

impl std::fmt::Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => f.write_str(UNSET),
            Self::Finished => f.write_str("finished"),
            Self::NotStarted => f.write_str("not started yet"),
            Self::Days(n) => write!(f, "{n} days"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("start", "2026-01-15").unwrap(), d("2026-01-15"));
        assert_eq!(parse_date("start", " 2026-01-15 ").unwrap(), d("2026-01-15"));
    }

    #[test]
    fn rejects_other_formats() {
        for bad in ["15/01/2026", "2026-13-01", "2026-02-30", "tomorrow", ""] {
            let err = parse_date("end", bad).unwrap_err();
            assert!(
                matches!(&err, ValidationError::InvalidDate { field, .. } if field == "end"),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn rejects_years_that_do_not_sort_as_text() {
        for bad in ["+10000-01-01", "10000-01-01", "-0001-01-01", "0000-06-01"] {
            assert!(parse_date("as-of", bad).is_err(), "{bad:?} was accepted");
        }
        assert_eq!(parse_date("as-of", "9999-12-31").unwrap(), last_date());
        assert_eq!(last_date().format(DATE_FORMAT).to_string(), "9999-12-31");
    }

    #[test]
    fn optional_dates_treat_blank_as_unset() {
        assert_eq!(parse_optional_date("start", None).unwrap(), None);
        assert_eq!(parse_optional_date("start", Some("")).unwrap(), None);
        assert_eq!(
            parse_optional_date("start", Some("2026-03-01")).unwrap(),
            Some(d("2026-03-01"))
        );
        assert!(parse_optional_date("start", Some("March")).is_err());
    }

    #[test]
    fn unset_dates_format_as_placeholder() {
        assert_eq!(format_date(None), "--");
        assert_eq!(format_date(Some(d("2026-07-04"))), "2026-07-04");
    }

    #[test]
    fn remaining_covers_every_window_position() {
        let start = Some(d("2026-02-01"));
        let end = Some(d("2026-02-28"));
        assert_eq!(Remaining::between(None, end, d("2026-02-10")), Remaining::Unknown);
        assert_eq!(Remaining::between(start, None, d("2026-02-10")), Remaining::Unknown);
        assert_eq!(Remaining::between(start, end, d("2026-01-20")), Remaining::NotStarted);
        assert_eq!(Remaining::between(start, end, d("2026-03-01")), Remaining::Finished);
        assert_eq!(Remaining::between(start, end, d("2026-02-18")), Remaining::Days(10));
        assert_eq!(Remaining::between(start, end, d("2026-02-28")), Remaining::Days(0));
    }

    #[test]
    fn remaining_display() {
        assert_eq!(Remaining::Unknown.to_string(), "--");
        assert_eq!(Remaining::Finished.to_string(), "finished");
        assert_eq!(Remaining::NotStarted.to_string(), "not started yet");
        assert_eq!(Remaining::Days(3).to_string(), "3 days");
    }
}
