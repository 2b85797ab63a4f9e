//! # exceptions CLI entry point
//!
//! Parses command-line arguments, refuses service accounts, opens the
//! database named in the config file and dispatches to the command
//! handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use polex_cli::account::Account;
use polex_cli::config::{self, Config};
use polex_cli::exception::{
    run_comment, run_delete, run_details, run_submit, run_transition, run_verify, CommentArgs,
    IdArgs, SubmitArgs, TransitionArgs, VerifyArgs,
};
use polex_cli::form::{run_form, FormArgs};
use polex_cli::help::EXAMPLES;
use polex_cli::listing::{run_list, run_report, ListArgs};
use polex_cli::schema::{run_createdb, run_destroydb, run_makenoodles};
use polex_cli::transfer::{run_dump, run_import};
use polex_cli::{guard, reference_day, require_config, Session};
use polex_state::ExceptionStatus;

/// Track policy exceptions from submission to removal.
#[derive(Parser, Debug)]
#[command(name = "exceptions", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file [default: ~/.exceptions_db.conf].
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every SQL statement.
    #[arg(long, global = true)]
    sql_debug: bool,

    /// Treat this date as today.
    #[arg(long, global = true, value_name = "YYYY-MM-DD", value_parser = parse_as_of)]
    as_of: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a new exception as undecided.
    Submit(SubmitArgs),

    /// Put an exception back up for decision.
    Undecide(TransitionArgs),

    /// Approve an undecided exception.
    Approve(TransitionArgs),

    /// Reject an undecided exception.
    Reject(TransitionArgs),

    /// Mark an approved exception as implemented.
    Implemented(TransitionArgs),

    /// Mark an implemented exception as removed.
    Remove(TransitionArgs),

    /// Delete an exception.
    Delete(IdArgs),

    /// Comment on an exception.
    Comment(CommentArgs),

    /// Show everything about one exception.
    #[command(visible_aliases = ["info", "detail"])]
    Details(IdArgs),

    /// Check cached statuses against the status change history.
    Verify(VerifyArgs),

    /// List exceptions in a class.
    List(ListArgs),

    /// Print the YAML status report.
    Report,

    /// Manage attached forms.
    Form(FormArgs),

    /// Write the whole database to stdout as JSON.
    Dumpjson,

    /// Load a `dumpjson` snapshot from stdin.
    Importjson,

    /// Create or upgrade the database schema.
    Createdb,

    /// Drop every table.
    Destroydb,

    /// Insert sample data.
    #[command(hide = true)]
    Makenoodles,

    /// Show usage examples.
    Examples,

    /// Print a starter configuration file.
    ConfigExample,
}

impl Commands {
    /// Commands that run without a database.
    fn is_standalone(&self) -> bool {
        matches!(self, Commands::Examples | Commands::ConfigExample)
    }
}

fn parse_as_of(value: &str) -> Result<NaiveDate, polex_core::ValidationError> {
    polex_core::parse_date("as-of", value)
}

/// Filter directives for the given verbosity.
fn filter_directives(verbose: u8, sql_debug: bool) -> String {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let sqlx = if sql_debug { "debug" } else { "warn" };
    format!("{level},sqlx={sqlx}")
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter_directives(cli.verbose, cli.sql_debug)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_path);
    let standalone = cli.command.is_standalone();
    let loaded = match Config::load_if_present(&config_path) {
        Ok(loaded) => loaded,
        Err(e) if standalone => {
            tracing::warn!("{e:#}");
            None
        }
        Err(e) => return Err(e),
    };

    let account = Account::current()?;
    guard(&account, loaded.as_ref())?;
    tracing::debug!(user = %account.name, uid = account.uid, "account accepted");

    match cli.command {
        Commands::Examples => {
            print!("{EXAMPLES}");
            return Ok(0);
        }
        Commands::ConfigExample => {
            print!("{}", config::example_text());
            return Ok(0);
        }
        _ => {}
    }

    let config = require_config(&config_path, loaded)?;
    let session = Session::open(config, &account, reference_day(cli.as_of)).await?;

    let result = match &cli.command {
        Commands::Submit(args) => run_submit(args, &session).await,
        Commands::Undecide(args) => run_transition(args, ExceptionStatus::Undecided, &session).await,
        Commands::Approve(args) => run_transition(args, ExceptionStatus::Approved, &session).await,
        Commands::Reject(args) => run_transition(args, ExceptionStatus::Rejected, &session).await,
        Commands::Implemented(args) => {
            run_transition(args, ExceptionStatus::Implemented, &session).await
        }
        Commands::Remove(args) => run_transition(args, ExceptionStatus::Removed, &session).await,
        Commands::Delete(args) => run_delete(args, &session).await,
        Commands::Comment(args) => run_comment(args, &session).await,
        Commands::Details(args) => run_details(args, &session).await,
        Commands::Verify(args) => run_verify(args, &session).await,
        Commands::List(args) => run_list(args, &session).await,
        Commands::Report => run_report(&session).await,
        Commands::Form(args) => run_form(args, &session).await,
        Commands::Dumpjson => run_dump(&session).await,
        Commands::Importjson => run_import(&session).await,
        Commands::Createdb => run_createdb(&session).await,
        Commands::Destroydb => run_destroydb(&session).await,
        Commands::Makenoodles => run_makenoodles(&session).await,
        Commands::Examples | Commands::ConfigExample => Ok(0),
    };

    session.pool.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use polex_cli::form::FormCommand;
    use polex_state::ListClass;

    #[test]
    fn cli_parse_submit_with_defaults() {
        let cli = Cli::try_parse_from(["exceptions", "submit", "--username", "ccspapp"]).unwrap();
        if let Commands::Submit(args) = cli.command {
            assert_eq!(args.username, "ccspapp");
            assert_eq!(args.service, "myriad");
            assert_eq!(args.exception_type, "quota");
            assert_eq!(args.detail, "5TB Scratch");
            assert!(args.ends.is_none());
            assert!(!args.edit_comment);
        } else {
            panic!("expected Submit");
        }
    }

    #[test]
    fn cli_parse_submit_requires_username() {
        assert!(Cli::try_parse_from(["exceptions", "submit"]).is_err());
    }

    #[test]
    fn cli_parse_submit_comment_flags_conflict() {
        let result = Cli::try_parse_from([
            "exceptions", "submit", "--username", "ccspapp", "-c", "hi", "-C",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_transition_force() {
        let cli = Cli::try_parse_from(["exceptions", "approve", "12", "-f"]).unwrap();
        if let Commands::Approve(args) = cli.command {
            assert_eq!(args.id, 12);
            assert!(args.force);
        } else {
            panic!("expected Approve");
        }

        let cli = Cli::try_parse_from(["exceptions", "implemented", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Implemented(ref a) if !a.force));
    }

    #[test]
    fn cli_parse_details_aliases() {
        for name in ["details", "info", "detail"] {
            let cli = Cli::try_parse_from(["exceptions", name, "7"]).unwrap();
            assert!(matches!(cli.command, Commands::Details(IdArgs { id: 7 })));
        }
    }

    #[test]
    fn cli_parse_list_class_and_service() {
        let cli = Cli::try_parse_from(["exceptions", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::List(ref a) if a.class == ListClass::All));

        let cli = Cli::try_parse_from(["exceptions", "list", "todo", "-c", "legion"]).unwrap();
        if let Commands::List(args) = cli.command {
            assert_eq!(args.class, ListClass::Todo);
            assert_eq!(args.service.as_deref(), Some("legion"));
        } else {
            panic!("expected List");
        }

        assert!(Cli::try_parse_from(["exceptions", "list", "everything"]).is_err());
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "exceptions", "report", "--as-of", "2026-10-01", "-vv", "--sql-debug",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Report));
        assert_eq!(cli.as_of, NaiveDate::from_ymd_opt(2026, 10, 1));
        assert_eq!(cli.verbose, 2);
        assert!(cli.sql_debug);
    }

    #[test]
    fn cli_parse_rejects_bad_as_of() {
        for bad in ["10/01/2026", "10000-01-01", "+10000-01-01"] {
            assert!(Cli::try_parse_from(["exceptions", "report", "--as-of", bad]).is_err());
        }
        let cli = Cli::try_parse_from(["exceptions", "report", "--as-of", "9999-12-31"]).unwrap();
        assert_eq!(cli.as_of, NaiveDate::from_ymd_opt(9999, 12, 31));
    }

    #[test]
    fn cli_parse_form_subcommands() {
        let cli = Cli::try_parse_from(["exceptions", "form", "attach", "4", "./dir/req.pdf"]).unwrap();
        if let Commands::Form(args) = cli.command {
            assert!(matches!(args.command, FormCommand::Attach { id: 4, .. }));
        } else {
            panic!("expected Form");
        }

        let cli = Cli::try_parse_from(["exceptions", "form", "download-for", "4"]).unwrap();
        if let Commands::Form(args) = cli.command {
            assert!(matches!(
                args.command,
                FormCommand::DownloadFor { id: 4, ref dir } if dir == &PathBuf::from(".")
            ));
        } else {
            panic!("expected Form");
        }
    }

    #[test]
    fn cli_parse_verify_optional_id() {
        let cli = Cli::try_parse_from(["exceptions", "verify"]).unwrap();
        assert!(matches!(cli.command, Commands::Verify(VerifyArgs { id: None })));
        let cli = Cli::try_parse_from(["exceptions", "verify", "9"]).unwrap();
        assert!(matches!(cli.command, Commands::Verify(VerifyArgs { id: Some(9) })));
    }

    #[test]
    fn cli_parse_standalone_commands() {
        let cli = Cli::try_parse_from(["exceptions", "config-example"]).unwrap();
        assert!(cli.command.is_standalone());
        let cli = Cli::try_parse_from(["exceptions", "makenoodles"]).unwrap();
        assert!(!cli.command.is_standalone());
    }

    #[test]
    fn sql_debug_raises_sqlx_level() {
        assert_eq!(filter_directives(0, false), "warn,sqlx=warn");
        assert_eq!(filter_directives(1, true), "info,sqlx=debug");
        assert_eq!(filter_directives(5, false), "trace,sqlx=warn");
    }
}
