//! # Service-Account Guard
//!
//! Changes are attributed to the invoking login, so the tool refuses to run
//! under shared or system accounts where that attribution would be
//! meaningless.

use anyhow::{Context, Result};
use nix::unistd::{getgid, getuid, User};
use serde::{Deserialize, Serialize};

/// Which accounts count as service accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceAccountPolicy {
    /// Highest uid reserved for system accounts.
    pub max_system_uid: u32,
    /// Group shared by the service accounts.
    pub service_gid: u32,
    /// Account names that are always refused.
    pub names: Vec<String>,
}

impl Default for ServiceAccountPolicy {
    fn default() -> Self {
        Self {
            max_system_uid: 500,
            service_gid: 215,
            names: vec!["SYSTEM".to_owned()],
        }
    }
}

/// The account running this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
}

impl Account {
    /// Resolve the real uid/gid and the login name behind them.
    pub fn current() -> Result<Self> {
        let uid = getuid();
        let gid = getgid();
        let name = match User::from_uid(uid).context("could not look up the current user")? {
            Some(user) => user.name,
            None => std::env::var("USER")
                .or_else(|_| std::env::var("LOGNAME"))
                .with_context(|| format!("uid {uid} has no passwd entry and USER is unset"))?,
        };
        Ok(Self {
            name,
            uid: uid.as_raw(),
            gid: gid.as_raw(),
        })
    }
}

impl ServiceAccountPolicy {
    /// Whether `account` must be refused.
    pub fn refuses(&self, account: &Account) -> bool {
        account.uid == 0
            || account.uid <= self.max_system_uid
            || account.gid == self.service_gid
            || self.names.iter().any(|n| n == &account.name)
    }
}
