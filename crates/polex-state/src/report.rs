//! # Report and List Vocabulary
//!
//! Names the report categories and list classes, and fixes the date
//! windows they are evaluated against. The predicates themselves run in
//! the store against persisted rows; this module only defines what they
//! mean.
//!
//! ## Report windows
//!
//! Relative to a reference day `today`:
//!
//! ```text
//! removal waiting        end <  today
//! five days              today     <= end < today+5
//! two weeks              today+5   <= end < today+14
//! ```
//!
//! The windows are half-open, so an exception ending exactly on `today+5`
//! is reported under two weeks, not five days.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use polex_core::temporal::last_date;
use polex_core::{ExceptionId, ValidationError};

/// Length of the "expires within five days" window.
pub const FIVE_DAYS: u64 = 5;

/// Upper edge of the "expires within two weeks" window.
pub const TWO_WEEKS: u64 = 14;

/// Operational buckets produced by the weekly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportCategory {
    /// Status is undecided.
    DecisionWaiting,
    /// Approved, start date strictly after today.
    ImplementationWaiting,
    /// Implemented, end date strictly before today.
    RemovalWaiting,
    /// Implemented, end date in `[today, today+5)`.
    ExpiresWithinFiveDays,
    /// Implemented, end date in `[today+5, today+14)`.
    ExpiresWithinTwoWeeks,
}

impl ReportCategory {
    /// Every category, in report order.
    pub const ALL: [ReportCategory; 5] = [
        Self::DecisionWaiting,
        Self::ImplementationWaiting,
        Self::RemovalWaiting,
        Self::ExpiresWithinFiveDays,
        Self::ExpiresWithinTwoWeeks,
    ];

    /// Short machine name.
    pub fn key(&self) -> &'static str {
        match self {
            Self::DecisionWaiting => "decision waiting",
            Self::ImplementationWaiting => "implementation waiting",
            Self::RemovalWaiting => "removal waiting",
            Self::ExpiresWithinFiveDays => "expires within five days",
            Self::ExpiresWithinTwoWeeks => "expires within two weeks",
        }
    }

    /// Heading used in the rendered report.
    pub fn title(&self) -> &'static str {
        match self {
            Self::DecisionWaiting => "Waiting for Decision",
            Self::ImplementationWaiting => "Waiting for Implementation",
            Self::RemovalWaiting => "Waiting for Removal",
            Self::ExpiresWithinFiveDays => "Will Expire Within Five Days",
            Self::ExpiresWithinTwoWeeks => "Will Expire Within Two Weeks",
        }
    }
}

impl std::fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The reference day and the window edges derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    /// Reference day.
    pub today: NaiveDate,
    /// `today + 5 days`.
    pub five_days: NaiveDate,
    /// `today + 14 days`.
    pub two_weeks: NaiveDate,
}

impl ReportWindow {
    /// Build the windows around `today`.
    ///
    /// Days past 9999-12-31 saturate there, so they still compare
    /// correctly against stored `YYYY-MM-DD` text.
    pub fn new(today: NaiveDate) -> Self {
        let last = last_date();
        let today = today.min(last);
        let ahead = |n| {
            today
                .checked_add_days(Days::new(n))
                .map_or(last, |d| d.min(last))
        };
        Self {
            today,
            five_days: ahead(FIVE_DAYS),
            two_weeks: ahead(TWO_WEEKS),
        }
    }
}

/// Category → exception IDs, for one reference day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Windows the report was computed against.
    pub window: ReportWindow,
    /// IDs per category, ascending. Every category has an entry.
    pub entries: BTreeMap<ReportCategory, Vec<ExceptionId>>,
}

#[derive(Serialize)]
struct RenderedSection<'a> {
    #[serde(rename = "Count")]
    count: usize,
    #[serde(rename = "IDs")]
    ids: &'a [ExceptionId],
}

impl Report {
    /// Start an empty report.
    pub fn empty(window: ReportWindow) -> Self {
        Self {
            window,
            entries: ReportCategory::ALL.iter().map(|c| (*c, Vec::new())).collect(),
        }
    }

    /// IDs in one category.
    pub fn ids(&self, category: ReportCategory) -> &[ExceptionId] {
        self.entries.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Render as YAML, omitting empty categories.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let mut body = serde_yaml::Mapping::new();
        for category in ReportCategory::ALL {
            let ids = self.ids(category);
            if ids.is_empty() {
                continue;
            }
            body.insert(
                category.title().into(),
                serde_yaml::to_value(RenderedSection {
                    count: ids.len(),
                    ids,
                })?,
            );
        }
        let mut root = serde_yaml::Mapping::new();
        root.insert("Report".into(), serde_yaml::Value::Mapping(body));
        serde_yaml::to_string(&root)
    }
}

/// Named filters accepted by `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListClass {
    /// Every live exception.
    All,
    /// Status is undecided.
    Undecided,
    /// Status is approved.
    Approved,
    /// Status is rejected.
    Rejected,
    /// Approved with a start date after today.
    Needed,
    /// Status is implemented.
    Active,
    /// Status is removed.
    Removed,
    /// Implemented with an end date before today.
    Overdue,
    /// Approved or implemented with a start date after today.
    Pending,
    /// Records with missing or contradictory dates.
    Inconsistent,
    /// Overdue, needed, or undecided.
    Todo,
}

impl ListClass {
    /// Every class, in help-text order.
    pub const ALL: [ListClass; 11] = [
        Self::All,
        Self::Undecided,
        Self::Approved,
        Self::Rejected,
        Self::Needed,
        Self::Active,
        Self::Removed,
        Self::Overdue,
        Self::Pending,
        Self::Inconsistent,
        Self::Todo,
    ];

    /// Name typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Undecided => "undecided",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Needed => "needed",
            Self::Active => "active",
            Self::Removed => "removed",
            Self::Overdue => "overdue",
            Self::Pending => "pending",
            Self::Inconsistent => "inconsistent",
            Self::Todo => "todo",
        }
    }
}

impl std::fmt::Display for ListClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ListClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|c| c.name()).collect();
                ValidationError::field("list class", format!("{s:?} is not one of {}", names.join(", ")))
            })
    }
}
