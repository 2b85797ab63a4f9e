//! # polex-cli: the `exceptions` Tool
//!
//! Command-line front end for policy exception tracking. Every invocation
//! opens the SQLite database named in the config file, runs one command
//! and exits.
//!
//! ## Commands
//!
//! - `submit`, `undecide`, `approve`, `reject`, `implemented`, `remove`,
//!   `delete`: create exceptions and move them through the lifecycle.
//! - `list`, `report`, `details`, `verify`: inspect them.
//! - `comment`, `form`: annotate them.
//! - `dumpjson`, `importjson`: bulk transfer.
//! - `createdb`, `destroydb`: schema management.
//!
//! ```bash
//! exceptions submit --username ccspapp --service myriad --type quota --detail "5TB Scratch"
//! exceptions approve 12
//! exceptions list todo
//! exceptions report --as-of 2026-10-19
//! ```

pub mod account;
pub mod config;
pub mod editor;
pub mod exception;
pub mod form;
pub mod help;
pub mod listing;
pub mod render;
pub mod schema;
pub mod transfer;

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use polex_store::{db, SqlitePool};

use crate::account::{Account, ServiceAccountPolicy};
use crate::config::Config;

/// Everything a database command needs.
pub struct Session {
    pub pool: SqlitePool,
    pub config: Config,
    /// Login recorded as the author of changes and comments.
    pub actor: String,
    /// Reference day for date-relative listings.
    pub today: NaiveDate,
}

impl Session {
    /// Connect to the database the config names.
    pub async fn open(config: Config, account: &Account, today: NaiveDate) -> Result<Self> {
        let target = config.connection_string();
        let pool = db::connect(&target)
            .await
            .with_context(|| format!("could not open database {target}"))?;
        Ok(Self {
            pool,
            config,
            actor: account.name.clone(),
            today,
        })
    }
}

/// Refuse to continue when running under a service account.
pub fn guard(account: &Account, config: Option<&Config>) -> Result<()> {
    let default_policy = ServiceAccountPolicy::default();
    let policy = config.map_or(&default_policy, |c| &c.service_account);
    if policy.refuses(account) {
        bail!(
            "refusing to run as service account {} (uid {}, gid {}); use your own login",
            account.name,
            account.uid,
            account.gid
        );
    }
    Ok(())
}

/// Load the config file, failing if it is missing.
pub fn require_config(path: &Path, loaded: Option<Config>) -> Result<Config> {
    match loaded {
        Some(config) => Ok(config),
        None => bail!(
            "config file {} not found; `exceptions config-example` prints a starting point",
            path.display()
        ),
    }
}

/// Today in the local time zone, unless overridden.
pub fn reference_day(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| chrono::Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_uses_defaults_without_config() {
        let root = Account {
            name: "root".into(),
            uid: 0,
            gid: 0,
        };
        assert!(guard(&root, None).is_err());

        let user = Account {
            name: "ccspapp".into(),
            uid: 40000,
            gid: 100,
        };
        assert!(guard(&user, None).is_ok());
    }

    #[test]
    fn missing_config_points_at_the_example() {
        let err = require_config(Path::new("/tmp/none.conf"), None).unwrap_err();
        assert!(err.to_string().contains("config-example"));
    }

    #[test]
    fn as_of_overrides_today() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(reference_day(Some(day)), day);
    }
}
