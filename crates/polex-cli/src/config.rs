//! # Configuration File
//!
//! YAML (a JSON config written for earlier versions of the tool is valid
//! YAML and still loads). Only the connection settings are required:
//!
//! ```yaml
//! db_type: sqlite
//! db_connection_string: ./exceptions.db
//! ```
//!
//! `DATABASE_URL` in the environment overrides `db_connection_string`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use polex_core::IntakePolicy;

use crate::account::ServiceAccountPolicy;

/// Name of the config file in the user's home directory.
pub const DEFAULT_FILE_NAME: &str = ".exceptions_db.conf";

/// Database backends accepted in `db_type`.
const SQLITE_TYPES: &[&str] = &["sqlite", "sqlite3"];

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub db_type: String,
    pub db_connection_string: String,
    #[serde(default)]
    pub intake: IntakePolicy,
    #[serde(default)]
    pub service_account: ServiceAccountPolicy,
}

impl Config {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("could not open config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("could not parse config file {}", path.display()))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file is `None` rather than an
    /// error.
    pub fn load_if_present(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    fn validate(&self) -> Result<()> {
        if !SQLITE_TYPES.contains(&self.db_type.to_lowercase().as_str()) {
            bail!(
                "unsupported db_type {:?}: expected one of {}",
                self.db_type,
                SQLITE_TYPES.join(", ")
            );
        }
        Ok(())
    }

    /// Connection string, honouring `DATABASE_URL`.
    pub fn connection_string(&self) -> String {
        self.connection_string_with(std::env::var("DATABASE_URL").ok())
    }

    fn connection_string_with(&self, env_override: Option<String>) -> String {
        match env_override {
            Some(url) if !url.trim().is_empty() => {
                tracing::debug!("using DATABASE_URL from the environment");
                url
            }
            _ => self.db_connection_string.clone(),
        }
    }
}

/// `$HOME/.exceptions_db.conf`, or the bare file name if `HOME` is unset.
pub fn default_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(DEFAULT_FILE_NAME),
        None => PathBuf::from(DEFAULT_FILE_NAME),
    }
}

/// A starter config with every optional section spelled out.
pub fn example_text() -> String {
    format!(
        "# Policy exception tracker configuration.\n\
         db_type: sqlite\n\
         db_connection_string: ./exceptions.db\n\
         \n\
         # Optional: values accepted by `submit`.\n\
         intake:\n  services: [{}]\n  exception_types: [{}]\n\
         \n\
         # Optional: accounts the tool refuses to run as.\n\
         service_account:\n  max_system_uid: 500\n  service_gid: 215\n  names: [SYSTEM]\n",
        polex_core::intake::DEFAULT_SERVICES.join(", "),
        polex_core::intake::DEFAULT_EXCEPTION_TYPES.join(", "),
    )
}
