//! # Exception Commands
//!
//! `submit`, the lifecycle transitions, `delete`, `comment`, `details` and
//! `verify`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Months, NaiveDate};
use clap::Args;

use polex_core::temporal::last_date;
use polex_core::ExceptionId;
use polex_state::{ExceptionStatus, Submission};
use polex_store::{annotations, lifecycle};

use crate::{editor, form, render, Session};

/// Arguments for `submit`.
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Username the exception applies to (7 characters, letters and digits).
    #[arg(long)]
    pub username: String,

    /// Date the request was submitted [default: today].
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub submitted: Option<String>,

    /// Date the exception starts [default: today].
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub starts: Option<String>,

    /// Date the exception ends [default: one year from today].
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub ends: Option<String>,

    /// Service the exception applies to.
    #[arg(long, default_value = "myriad")]
    pub service: String,

    /// Kind of exception.
    #[arg(long = "type", default_value = "quota")]
    pub exception_type: String,

    /// Free-text description of what was granted.
    #[arg(long, default_value = "5TB Scratch")]
    pub detail: String,

    /// Attach this file to the new exception.
    #[arg(long, value_name = "FILE")]
    pub form: Option<PathBuf>,

    /// Add this comment to the new exception.
    #[arg(short = 'c', long = "comment", value_name = "TEXT", conflicts_with = "edit_comment")]
    pub comment: Option<String>,

    /// Write a comment in $EDITOR.
    #[arg(short = 'C', long = "edit-comment")]
    pub edit_comment: bool,
}

impl SubmitArgs {
    /// Fill in the date defaults relative to `today`.
    pub fn submission(&self, today: NaiveDate) -> Submission {
        let next_year = today
            .checked_add_months(Months::new(12))
            .map_or(last_date(), |d| d.min(last_date()));
        Submission {
            username: self.username.clone(),
            submitted: self.submitted.clone().unwrap_or_else(|| today.to_string()),
            starts: self.starts.clone().unwrap_or_else(|| today.to_string()),
            ends: self.ends.clone().unwrap_or_else(|| next_year.to_string()),
            service: self.service.clone(),
            exception_type: self.exception_type.clone(),
            detail: self.detail.clone(),
        }
    }
}

/// An exception ID plus the override for the transition table.
#[derive(Args, Debug)]
pub struct TransitionArgs {
    /// Exception ID.
    pub id: i64,

    /// Apply the change even if the current status does not allow it.
    #[arg(short, long)]
    pub force: bool,
}

/// A bare exception ID.
#[derive(Args, Debug)]
pub struct IdArgs {
    /// Exception ID.
    pub id: i64,
}

/// Arguments for `comment`.
#[derive(Args, Debug)]
pub struct CommentArgs {
    /// Exception ID.
    pub id: i64,

    /// Comment text; $EDITOR is opened when omitted.
    #[arg(short = 'c', long = "comment", value_name = "TEXT")]
    pub text: Option<String>,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Check a single exception instead of all of them.
    pub id: Option<i64>,
}

/// Validate, insert and optionally annotate a new exception.
pub async fn run_submit(args: &SubmitArgs, session: &Session) -> Result<u8> {
    let new = args
        .submission(session.today)
        .validate(&session.config.intake)
        .context("invalid submission")?;

    // Gather everything that can fail before writing anything.
    let attachment = args.form.as_deref().map(form::read_form).transpose()?;
    let comment = match (&args.comment, args.edit_comment) {
        (Some(text), _) => Some(text.clone()),
        (None, true) => Some(editor::read_from_editor()?),
        (None, false) => None,
    };

    let id = lifecycle::submit(&session.pool, &new, &session.actor).await?;
    println!("OK: submitted exception {id} for {}", new.username);

    if let Some((file_name, contents)) = attachment {
        let file_id = annotations::attach(&session.pool, id, &file_name, &contents)
            .await
            .with_context(|| format!("exception {id} was submitted but {file_name} was not attached"))?;
        println!("OK: attached {file_name} as form {file_id}");
    }
    if let Some(text) = comment {
        annotations::add_comment(&session.pool, id, &session.actor, &text)
            .await
            .with_context(|| format!("exception {id} was submitted but the comment was not saved"))?;
        println!("OK: comment added");
    }
    Ok(0)
}

/// Move an exception to `target`.
pub async fn run_transition(
    args: &TransitionArgs,
    target: ExceptionStatus,
    session: &Session,
) -> Result<u8> {
    let id = ExceptionId(args.id);
    let pool = &session.pool;
    let actor = session.actor.as_str();

    let from = lifecycle::get_status(pool, id).await?;
    let applied = match target {
        ExceptionStatus::Undecided => lifecycle::undecide(pool, id, actor, args.force).await,
        ExceptionStatus::Approved => lifecycle::approve(pool, id, actor, args.force).await,
        ExceptionStatus::Rejected => lifecycle::reject(pool, id, actor, args.force).await,
        ExceptionStatus::Implemented => lifecycle::implement(pool, id, actor, args.force).await,
        ExceptionStatus::Removed => lifecycle::remove(pool, id, actor, args.force).await,
        ExceptionStatus::Unrecorded => bail!("{target} is not a status an exception can move to"),
    };
    applied.with_context(|| format!("could not move exception {id} to {target}"))?;

    println!("OK: exception {id} {from} -> {target}");
    Ok(0)
}

/// Soft-delete an exception.
pub async fn run_delete(args: &IdArgs, session: &Session) -> Result<u8> {
    let id = ExceptionId(args.id);
    lifecycle::delete(&session.pool, id, &session.actor).await?;
    println!("OK: deleted exception {id}");
    Ok(0)
}

/// Add a comment, from `-c` or the editor.
pub async fn run_comment(args: &CommentArgs, session: &Session) -> Result<u8> {
    let id = ExceptionId(args.id);
    // Fail on a missing exception before the user types anything.
    lifecycle::get_status(&session.pool, id).await?;

    let text = match &args.text {
        Some(text) => text.clone(),
        None => editor::read_from_editor()?,
    };
    let comment_id = annotations::add_comment(&session.pool, id, &session.actor, &text).await?;
    println!("OK: comment {comment_id} added to exception {id}");
    Ok(0)
}

/// Print everything known about one exception.
pub async fn run_details(args: &IdArgs, session: &Session) -> Result<u8> {
    let view = lifecycle::details(&session.pool, ExceptionId(args.id)).await?;
    print!("{}", render::details(&view, session.today));
    Ok(0)
}

/// Compare cached statuses with the ledger. Exit code 1 if any differ.
pub async fn run_verify(args: &VerifyArgs, session: &Session) -> Result<u8> {
    let divergences = lifecycle::verify(&session.pool, args.id.map(ExceptionId)).await?;
    if divergences.is_empty() {
        println!("OK: cached status matches the ledger");
        return Ok(0);
    }
    for divergence in &divergences {
        println!("MISMATCH: {divergence}");
    }
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polex_core::IntakePolicy;

    fn args(username: &str) -> SubmitArgs {
        SubmitArgs {
            username: username.into(),
            submitted: None,
            starts: None,
            ends: None,
            service: "myriad".into(),
            exception_type: "quota".into(),
            detail: "5TB Scratch".into(),
            form: None,
            comment: None,
            edit_comment: false,
        }
    }

    #[test]
    fn dates_default_to_a_year_from_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let new = args("ccspapp")
            .submission(today)
            .validate(&IntakePolicy::default())
            .unwrap();
        assert_eq!(new.submitted_date, today);
        assert_eq!(new.start_date, today);
        assert_eq!(new.end_date, NaiveDate::from_ymd_opt(2027, 10, 19).unwrap());
    }

    #[test]
    fn explicit_dates_are_kept() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut a = args("ccspapp");
        a.ends = Some("2026-12-01".into());
        let submission = a.submission(today);
        assert_eq!(submission.ends, "2026-12-01");
        assert_eq!(submission.starts, "2026-10-19");
    }

    #[test]
    fn default_end_stops_at_the_last_storable_day() {
        let today = NaiveDate::from_ymd_opt(9999, 6, 1).unwrap();
        assert_eq!(args("ccspapp").submission(today).ends, "9999-12-31");
    }

    #[test]
    fn leap_day_defaults_clamp_to_month_end() {
        let today = NaiveDate::from_ymd_opt(2028, 2, 29).unwrap();
        assert_eq!(args("ccspapp").submission(today).ends, "2029-02-28");
    }
}
