//! `list` and `report`.

use anyhow::{Context, Result};
use clap::Args;

use polex_state::ListClass;
use polex_store::classify;

use crate::{render, Session};

/// Arguments for `list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// all, undecided, approved, rejected, needed, active, removed, overdue,
    /// pending, inconsistent or todo.
    #[arg(default_value = "all")]
    pub class: ListClass,

    /// Only show exceptions for this service.
    #[arg(short = 'c', long)]
    pub service: Option<String>,
}

pub async fn run_list(args: &ListArgs, session: &Session) -> Result<u8> {
    let service = args.service.as_deref().map(str::to_lowercase);
    let rows = classify::list(&session.pool, args.class, service.as_deref(), session.today).await?;
    print!("{}", render::summary_table(&rows));
    Ok(0)
}

/// Print the periodic YAML report.
pub async fn run_report(session: &Session) -> Result<u8> {
    let report = classify::report(&session.pool, session.today).await?;
    let text = report.to_yaml().context("could not render the report")?;
    print!("{text}");
    Ok(0)
}
